//! session 検証 → RequestSession / RequestUser を extensions に入れる
//!
//! - engine に headers を渡して session を引く (engine 側のエラーはそのまま伝播)
//! - 結果に関わらず session / user を extensions に載せる
//! - public marker (handler → controller の順) があれば通す
//! - それ以外で session が無ければ 401 UNAUTHORIZED

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use super::metadata::RouteMetadata;
use crate::error::AppError;
use crate::extractors::{RequestSession, RequestUser};
use crate::services::engine::EngineHandle;

#[derive(Clone, Debug)]
pub struct AuthGuard {
    engine: EngineHandle,
    metadata: Arc<RouteMetadata>,
}

impl AuthGuard {
    pub fn new(engine: EngineHandle, metadata: RouteMetadata) -> Self {
        Self {
            engine,
            metadata: Arc::new(metadata),
        }
    }

    /// router の全 route に guard を掛ける。
    ///
    /// `route_layer` なので routing 後に走り、`MatchedPath` で route を特定できる。
    /// auth routes (`AuthModule::configure`) より先に適用すること。
    ///
    /// ```ignore
    /// let app = guard.apply(api::v1::routes());
    /// let app = module.configure(app)?;
    /// ```
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(self, auth_guard))
    }

    /// Resolve the session, attach it, then decide. `Ok(())` means the request may proceed.
    pub async fn can_activate(&self, req: &mut Request<Body>) -> Result<(), AppError> {
        let session = self.engine.get_session(req.headers()).await?;

        let user = session.as_ref().map(|s| s.user.clone());
        let has_session = session.is_some();
        req.extensions_mut().insert(RequestSession(session));
        req.extensions_mut().insert(RequestUser(user));

        let path = req
            .extensions()
            .get::<MatchedPath>()
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());

        if self.metadata.is_public(req.method(), &path) {
            tracing::debug!(method = %req.method(), route = %path, "public route");
            return Ok(());
        }

        if !has_session {
            tracing::debug!(method = %req.method(), route = %path, "no session");
            return Err(AppError::Unauthorized);
        }

        Ok(())
    }
}

async fn auth_guard(
    State(guard): State<AuthGuard>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    guard.can_activate(&mut req).await?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{CurrentUser, Session};
    use crate::services::engine::testing::ScriptedEngine;
    use crate::types::{User, UserSession};
    use axum::{
        Extension, Json,
        body::to_bytes,
        http::{Method, StatusCode},
        routing::get,
    };
    use chrono::Duration;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn who(user: Option<CurrentUser>, Extension(req_user): Extension<RequestUser>) -> Json<Value> {
        Json(json!({
            "user": user.map(|u| u.0.id),
            "request_user": req_user.0.map(|u| u.id),
        }))
    }

    async fn session_id(session: Session) -> String {
        session.session.id.clone()
    }

    fn app(engine: ScriptedEngine, metadata: RouteMetadata) -> Router {
        let guard = AuthGuard::new(EngineHandle::new(engine), metadata);
        let routes = Router::new()
            .route("/public", get(who))
            .route("/private", get(who))
            .route("/session", get(session_id))
            .route("/items/{id}", get(who))
            .route("/open/{id}", get(who));
        guard.apply(routes)
    }

    fn signed_in() -> ScriptedEngine {
        ScriptedEngine::with_session(UserSession::new(
            User::new("u1"),
            "tok",
            Duration::minutes(5),
        ))
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
        let res = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }

    fn public_meta() -> RouteMetadata {
        RouteMetadata::new().public_handler(Method::GET, "/public")
    }

    #[tokio::test]
    async fn rejects_private_route_without_session() {
        let (status, body) = call(app(ScriptedEngine::default(), public_meta()), "/private").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn allows_private_route_with_session_and_attaches_user() {
        let (status, body) = call(app(signed_in(), public_meta()), "/private").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], "u1");
        assert_eq!(body["request_user"], "u1");
    }

    #[tokio::test]
    async fn public_route_allows_anonymous() {
        let (status, body) = call(app(ScriptedEngine::default(), public_meta()), "/public").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], Value::Null);
        assert_eq!(body["request_user"], Value::Null);
    }

    #[tokio::test]
    async fn public_route_still_populates_session() {
        let (status, body) = call(app(signed_in(), public_meta()), "/public").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], "u1");
    }

    #[tokio::test]
    async fn matches_route_patterns_not_raw_paths() {
        let meta = RouteMetadata::new().public_handler(Method::GET, "/open/{id}");
        let (status, _) = call(app(ScriptedEngine::default(), meta.clone()), "/open/42").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(app(ScriptedEngine::default(), meta), "/items/42").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn handler_marker_overrides_private_controller() {
        let meta = RouteMetadata::new()
            .controller("/", crate::tokens::IS_PUBLIC_KEY, false)
            .public_handler(Method::GET, "/public");
        let (status, _) = call(app(ScriptedEngine::default(), meta.clone()), "/public").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(app(ScriptedEngine::default(), meta), "/private").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_extractor_sees_guard_result() {
        let (status, _) = call(app(signed_in(), RouteMetadata::new()), "/session").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn engine_failure_propagates() {
        let engine = ScriptedEngine {
            fail_session: true,
            ..ScriptedEngine::default()
        };
        let (status, body) = call(app(engine, public_meta()), "/public").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
    }
}
