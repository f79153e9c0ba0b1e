//! CORS layer built from `[server.cors]`.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use cinebook_core::config::CorsConfig;

use super::idempotency::{IDEMPOTENCY_KEY_HEADER, REPLAYED_HEADER};
use super::rate_limit::{LIMIT_HEADER, REMAINING_HEADER, RESET_HEADER};

/// Unparseable origins and methods are skipped with a warning.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(config.allowed_origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| tracing::warn!(%origin, "Ignoring invalid CORS origin"))
                .ok()
        }))
    };

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|method| {
            method
                .parse()
                .inspect_err(|_| tracing::warn!(%method, "Ignoring invalid CORS method"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(IDEMPOTENCY_KEY_HEADER),
        ])
        .expose_headers([
            header::RETRY_AFTER,
            HeaderName::from_static(REPLAYED_HEADER),
            HeaderName::from_static(LIMIT_HEADER),
            HeaderName::from_static(REMAINING_HEADER),
            HeaderName::from_static(RESET_HEADER),
        ])
        .max_age(Duration::from_secs(config.max_age_seconds))
}
