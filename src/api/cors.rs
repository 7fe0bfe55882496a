//! CORS policy for the API.

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::error::ServerError;

/// Build the CORS layer for the given origins.
///
/// Credentials are allowed, so methods and headers are mirrored from the
/// request instead of answered with `*`.
pub fn cors_layer<S: AsRef<str>>(origins: &[S]) -> Result<CorsLayer, ServerError> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin.as_ref())
                .map_err(|_| ServerError::InvalidOrigin(origin.as_ref().to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}
