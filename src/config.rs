//! Application configuration loaded from environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::net::TcpListener;

use crate::error::{Result, ServerError};

/// Origins the bundled frontend is served from during development.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = [
    "http://localhost:3000",
    // Vite preview
    "http://localhost:5173",
];

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// Host name or IP address to bind the HTTP server to (`BIND_HOST`).
    ///
    /// Not read from `HOST`, which some shells export as the machine name.
    #[serde(default = "default_host", rename = "bind_host")]
    pub host: String,

    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    // === CORS ===
    /// Production frontend origin, appended to the default origin list.
    #[serde(default)]
    pub frontend_url: Option<String>,

    // === Data ===
    /// Path of the decision tree JSON document.
    #[serde(default = "default_tree_file")]
    pub tree_file: PathBuf,

    /// Directory holding a frontend build. Mounted only if it exists at startup.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    // === Observability ===
    /// Expose Prometheus metrics on `/metrics`.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_tree_file() -> PathBuf {
    PathBuf::from("../decision_tree.json")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            frontend_url: None,
            tree_file: default_tree_file(),
            static_dir: default_static_dir(),
            metrics_enabled: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Load configuration from an explicit set of `(KEY, value)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(pairs)?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ServerError::InvalidListenAddr(self.host.clone()));
        }

        if self.tree_file.as_os_str().is_empty() {
            return Err(ServerError::InvalidConfig(
                "TREE_FILE must not be empty".to_string(),
            ));
        }

        for origin in self.allowed_origins() {
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                return Err(ServerError::InvalidOrigin(origin));
            }
        }

        Ok(())
    }

    /// `host:port` as configured, for display.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Bind the HTTP listener. Host names are resolved.
    pub async fn bind_listener(&self) -> Result<TcpListener> {
        Ok(TcpListener::bind((self.host.as_str(), self.port)).await?)
    }

    /// The CORS origin list: the defaults plus `FRONTEND_URL` when set.
    ///
    /// Browsers never send a trailing slash in `Origin`, so one is stripped
    /// from the configured value. Empty values and duplicates are skipped.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(|origin| origin.to_string())
            .collect();

        if let Some(url) = &self.frontend_url {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() && !origins.iter().any(|o| o == url) {
                origins.push(url.to_string());
            }
        }

        origins
    }

    /// The static directory, if it exists right now.
    pub fn static_dir_if_present(&self) -> Option<&Path> {
        self.static_dir
            .is_dir()
            .then_some(self.static_dir.as_path())
    }
}
