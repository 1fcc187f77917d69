//! In-memory engine for local development and tests.
//!
//! Sessions are looked up by `Authorization: Bearer <token>` first, then by the
//! session cookie. It serves a minimal set of engine routes under its base path:
//! - `GET  {base}/ok`
//! - `GET  {base}/get-session`
//! - `POST {base}/sign-out`
use std::collections::HashMap;

use async_trait::async_trait;
use axum::{
    Json,
    body::Body,
    http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, header},
    response::IntoResponse,
};
use chrono::Duration;
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthEngine, EngineResult};
use crate::types::{User, UserSession};

pub const SESSION_COOKIE: &str = "auth.session_token";

#[derive(Debug, Default)]
pub struct InMemoryEngine {
    base_path: Option<String>,
    sessions: RwLock<HashMap<String, UserSession>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Create a session for `user` under a fresh random token.
    pub async fn issue_session(&self, user: User, ttl: Duration) -> UserSession {
        let token = Uuid::new_v4().simple().to_string();
        let session = UserSession::new(user, token, ttl);
        self.insert_session(session.clone()).await;
        session
    }

    pub async fn insert_session(&self, session: UserSession) {
        let token = session.session.token.clone();
        self.sessions.write().await.insert(token, session);
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    async fn lookup(&self, token: &str) -> Option<UserSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|s| !s.session.is_expired())
            .cloned()
    }

    fn route<'a>(&self, path: &'a str) -> &'a str {
        let base = self
            .base_path
            .as_deref()
            .unwrap_or(crate::tokens::DEFAULT_BASE_PATH)
            .trim_end_matches('/');
        path.strip_prefix(base).unwrap_or(path)
    }
}

/// Bearer token wins over the cookie when both are present.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

#[async_trait]
impl AuthEngine for InMemoryEngine {
    fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    async fn get_session(&self, headers: &HeaderMap) -> EngineResult<Option<UserSession>> {
        match session_token(headers) {
            Some(token) => Ok(self.lookup(&token).await),
            None => Ok(None),
        }
    }

    async fn handle(&self, req: Request<Body>) -> EngineResult<Response<Body>> {
        let path = req.uri().path().to_string();
        let response = match (req.method(), self.route(&path)) {
            (&Method::GET, "/ok") => Json(json!({ "ok": true })).into_response(),
            (&Method::GET, "/get-session") => {
                let session = self.get_session(req.headers()).await?;
                Json(session).into_response()
            }
            (&Method::POST, "/sign-out") => {
                if let Some(token) = session_token(req.headers()) {
                    self.revoke(&token).await;
                }
                let mut res = Json(json!({ "success": true })).into_response();
                let expired = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly");
                if let Ok(value) = HeaderValue::from_str(&expired) {
                    res.headers_mut().append(header::SET_COOKIE, value);
                }
                res
            }
            _ => (
                StatusCode::NOT_FOUND,
                Json(json!({ "code": "NOT_FOUND", "message": "Not Found" })),
            )
                .into_response(),
        };

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn resolves_session_from_bearer_and_cookie() {
        let engine = InMemoryEngine::new();
        let issued = engine
            .issue_session(User::new("u1"), Duration::minutes(5))
            .await;
        let token = issued.session.token.clone();

        let found = engine.get_session(&bearer(&token)).await.unwrap();
        assert_eq!(found.map(|s| s.user.id), Some("u1".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={token}")).unwrap(),
        );
        assert!(engine.get_session(&headers).await.unwrap().is_some());

        assert!(engine.get_session(&HeaderMap::new()).await.unwrap().is_none());
        assert!(engine.get_session(&bearer("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_ignored() {
        let engine = InMemoryEngine::new();
        let session = UserSession::new(User::new("u1"), "old", Duration::seconds(-10));
        engine.insert_session(session).await;

        assert!(engine.get_session(&bearer("old")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn handles_get_session_and_sign_out() {
        let engine = InMemoryEngine::new().with_base_path("/api/auth");
        let issued = engine
            .issue_session(User::new("u1"), Duration::minutes(5))
            .await;
        let token = issued.session.token.clone();

        let req = Request::builder()
            .uri("/api/auth/get-session")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let res = engine.handle(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["user"]["id"], "u1");

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/sign-out")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let res = engine.handle(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(header::SET_COOKIE));
        assert!(engine.get_session(&bearer(&token)).await.unwrap().is_none());

        let req = Request::builder()
            .uri("/api/auth/unknown")
            .body(Body::empty())
            .unwrap();
        let res = engine.handle(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
