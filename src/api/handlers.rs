//! HTTP API handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::debug;

use crate::error::TreeError;
use crate::metrics;
use crate::tree::TreeStore;

/// Message returned by the health check.
pub const HEALTH_MESSAGE: &str = "Decision Tree API";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Source of the decision tree document.
    pub tree: TreeStore,
    /// Prometheus handle, when metrics are exported.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state without metrics export.
    pub fn new(tree: TreeStore) -> Self {
        Self {
            tree,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle so `/metrics` is served.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
    /// Service name.
    pub message: &'static str,
}

/// Body for unmatched routes.
#[derive(Debug, Serialize)]
pub struct NotFoundResponse {
    /// Always "Not Found".
    pub detail: &'static str,
}

/// Health check handler - always returns 200, whatever state the tree file is in.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        message: HEALTH_MESSAGE,
    })
}

/// Tree handler - returns the full decision tree document.
///
/// The file's bytes are sent unchanged once they parse as JSON.
pub async fn tree(State(state): State<AppState>) -> Result<impl IntoResponse, TreeError> {
    metrics::inc_tree_requests();
    let _timer = metrics::timer_tree_load();

    match state.tree.load().await {
        Ok(tree) => {
            debug!(
                path = %state.tree.path().display(),
                bytes = tree.len(),
                "served decision tree"
            );
            Ok((
                [(header::CONTENT_TYPE, "application/json")],
                tree.into_bytes(),
            ))
        }
        Err(err) => {
            metrics::inc_tree_load_failures(err.code());
            Err(err)
        }
    }
}

/// Metrics handler - Prometheus text exposition.
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => not_found().await.into_response(),
    }
}

/// Fallback handler when no static bundle is mounted.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            detail: "Not Found",
        }),
    )
}
