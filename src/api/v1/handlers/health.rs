/*
 * Responsibility
 * - GET /health (疎通用)
 * - GET /public (session 無しでも通る route の確認用)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::extractors::CurrentUser;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Public, but still sees the session when one is sent.
pub async fn public(user: Option<CurrentUser>) -> impl IntoResponse {
    Json(json!({
        "message": "public",
        "userId": user.map(|u| u.0.id),
    }))
}
