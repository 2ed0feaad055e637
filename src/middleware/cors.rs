//! CORS policy for the browser frontends.
//!
//! Policy:
//! - Production: allowlist origins from `CORS_ALLOWED_ORIGINS` (exact match). Empty list
//!   means no CORS headers at all.
//! - Development: the configured list if any, otherwise the local Vite / dev-server origins.
//! - Never with credentials: the frontends send the token in `Authorization`, not cookies.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::middleware::http::REQUEST_ID_HEADER;

const DEV_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:5175",
    "http://localhost:3000",
];

pub fn apply(router: Router, config: &Config) -> Router {
    router.layer(layer(config))
}

fn allowed_origins(config: &Config) -> Vec<HeaderValue> {
    let configured = config
        .cors_allowed_origins
        .iter()
        .filter_map(|s| HeaderValue::from_str(s).ok());

    if config.app_env.is_production() || !config.cors_allowed_origins.is_empty() {
        configured.collect()
    } else {
        DEV_ORIGINS.iter().map(|s| HeaderValue::from_static(s)).collect()
    }
}

fn layer(config: &Config) -> CorsLayer {
    let allowed = allowed_origins(config);

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
            allowed.iter().any(|v| v == origin)
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .max_age(Duration::from_secs(60 * 10))
}
