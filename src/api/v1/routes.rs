/*
 * Responsibility
 * - demo app の URL 構造を定義
 * - public にする route をここで宣言する (RouteMetadata)
 * - guard の適用は app 側 (auth routes より先に route_layer で掛ける)
 */
use axum::{Router, http::Method, routing::get};

use crate::api::v1::handlers::{
    health::{health, public},
    profile::{me, private, session},
};
use crate::middleware::auth::RouteMetadata;

pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/public", get(public))
        .route("/private", get(private))
        .route("/me", get(me))
        .route("/session", get(session))
}

/// Public markers for `routes()`.
pub fn metadata() -> RouteMetadata {
    RouteMetadata::new()
        .public_handler(Method::GET, "/public")
        .public_controller("/health")
}
