//! CORS policy for browser clients of the auth routes.
//!
//! The engine authenticates browsers with a session cookie, so responses must
//! allow credentials. That rules out a wildcard origin in every environment.
//!
//! Policy:
//! - Development: mirror the request origin, with credentials.
//! - Production: allowlist origins from Config (comma-separated env var), with credentials.
//!   An empty allowlist allows nothing.

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;

pub fn apply(router: Router, config: &Config) -> Router {
    let allow_origin = if config.app_env.is_production() {
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
            allowed.iter().any(|v| v == origin)
        })
    } else {
        AllowOrigin::mirror_request()
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
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
            HeaderName::from_static("x-request-id"),
        ])
        // bearer token を返す engine 向け
        .expose_headers([HeaderName::from_static("set-auth-token")])
        .max_age(std::time::Duration::from_secs(60 * 10));

    router.layer(cors)
}
