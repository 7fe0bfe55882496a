//! Read-only HTTP API for a decision tree document.
//!
//! The server hands a single JSON document to a separate frontend. It never
//! interprets or edits the document: each `GET /api/tree` reads the file from
//! disk and returns it, so the author can change the tree without restarting
//! anything.
//!
//! ```text
//! GET /          -> {"status": "ok", "message": "Decision Tree API"}
//! GET /api/tree  -> contents of TREE_FILE
//! GET /metrics   -> Prometheus exposition (when enabled)
//! GET /<other>   -> STATIC_DIR, if it existed at startup
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Startup and per-request error types
//! - [`tree`]: Reading the decision tree document
//! - [`api`]: HTTP router, handlers and CORS policy
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod tree;
pub mod utils;

pub use config::Config;
pub use error::{Result, ServerError, TreeError};
pub use tree::TreeStore;
