/*
 * Responsibility
 * - session 必須の route
 *   - GET /private : guard を通ったことの確認
 *   - GET /me      : CurrentUser
 *   - GET /session : Session (session + user)
 */
use axum::{Json, response::IntoResponse};
use serde_json::json;

use crate::extractors::{CurrentUser, Session};
use crate::types::{User, UserSession};

pub async fn private() -> impl IntoResponse {
    Json(json!({"message": "private"}))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

pub async fn session(Session(session): Session) -> Json<UserSession> {
    Json(session)
}
