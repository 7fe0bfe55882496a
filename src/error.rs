//! Error types for the decision tree API.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use strum::IntoStaticStr;
use thiserror::Error;
use tracing::warn;

/// Startup and configuration errors. Fatal to the process.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// A configuration value is present but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A CORS origin that cannot be used as a header value.
    #[error("invalid CORS origin: {0:?}")]
    InvalidOrigin(String),

    /// `BIND_HOST` is empty.
    #[error("invalid listen address: {0:?}")]
    InvalidListenAddr(String),

    /// IO error (resolving or binding the listen address).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures loading the decision tree document for a single request.
///
/// Neither variant is fatal: the request gets an error response and the
/// server keeps running.
#[derive(Error, Debug, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TreeError {
    /// The file is missing or could not be read.
    #[error("decision tree data unavailable at {}: {source}", path.display())]
    DataUnavailable {
        /// Configured tree file path.
        path: PathBuf,
        /// Underlying read error.
        source: std::io::Error,
    },

    /// The file was read but is not valid JSON.
    #[error("decision tree data at {} is not valid JSON: {source}", path.display())]
    DataMalformed {
        /// Configured tree file path.
        path: PathBuf,
        /// Parse error with line and column.
        source: serde_json::Error,
    },
}

impl TreeError {
    /// Machine-readable error code, e.g. `DATA_UNAVAILABLE`.
    pub fn code(&self) -> &'static str {
        self.into()
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// JSON body for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always "error".
    pub status: &'static str,
    /// Machine-readable code.
    pub code: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl IntoResponse for TreeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.to_string();

        warn!(code, %message, "failed to load decision tree");

        let body = ErrorBody {
            status: "error",
            code,
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServerError>;
