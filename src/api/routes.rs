//! HTTP API route definitions.

use std::path::Path;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers::{health, not_found, prometheus_metrics, tree, AppState};

/// Create the API router.
///
/// When `static_dir` is given, every path that matches no route is served
/// from it, with `index.html` as the default document for directories.
pub fn create_router(state: AppState, cors: CorsLayer, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        // Health endpoint
        .route("/", get(health))
        // Decision tree
        .route("/api/tree", get(tree));

    if state.metrics.is_some() {
        router = router.route("/metrics", get(prometheus_metrics));
    }

    let router = match static_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "serving static assets");
            router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true))
        }
        None => router.fallback(not_found),
    };

    router
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Create a minimal health-only router.
pub fn health_router() -> Router {
    Router::new().route("/", get(health))
}
