//! HTTP API module for the health, tree, and metrics endpoints.

pub mod cors;
pub mod handlers;
pub mod routes;

pub use cors::cors_layer;
pub use handlers::AppState;
pub use routes::{create_router, health_router};
