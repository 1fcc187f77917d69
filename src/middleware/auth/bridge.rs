//! Auth route bridge: hands every request under the base path to the engine.
//!
//! One `RoutingStrategy` per HTTP runtime, picked once at startup from
//! `AdapterOptions::routing_provider`:
//! - `ExpressStrategy`: body parser passthrough + forward the request untouched.
//! - `FastifyStrategy`: rebuild a fresh request (headers, drained body, absolute
//!   URL from `Host`), then copy the engine's response back field by field.
//!
//! Bridge routes are terminal: the engine's response is the response.

use std::borrow::Cow;

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderMap, Request, Response, Uri, header, uri::Authority},
    routing::any,
};

use crate::error::AppError;
use crate::middleware::{body::read_capped, body_parser};
use crate::state::AuthState;
use crate::types::RoutingProvider;

pub trait RoutingStrategy: Send + Sync {
    fn provider(&self) -> RoutingProvider;

    /// Install the auth interception pipeline on `router`.
    fn install(&self, router: Router, state: AuthState) -> Router;
}

pub fn strategy_for(provider: RoutingProvider) -> Box<dyn RoutingStrategy> {
    match provider {
        RoutingProvider::Express => Box::new(ExpressStrategy),
        RoutingProvider::Fastify => Box::new(FastifyStrategy),
    }
}

/// `{base}`, `{base}/`, `{base}/{*path}` に handler を張る
///
/// `{*path}` は空の tail に match しないので `{base}/` は別に登録する
fn bridge_routes<H, T>(state: &AuthState, handler: H) -> Router
where
    H: axum::handler::Handler<T, AuthState>,
    T: 'static,
{
    let base = state.base_path.to_string();
    Router::new()
        .route(&base, any(handler.clone()))
        .route(&format!("{base}/"), any(handler.clone()))
        .route(&format!("{base}/{{*path}}"), any(handler))
        .with_state(state.clone())
}

#[derive(Debug, Clone, Copy)]
pub struct ExpressStrategy;

impl RoutingStrategy for ExpressStrategy {
    fn provider(&self) -> RoutingProvider {
        RoutingProvider::Express
    }

    fn install(&self, router: Router, state: AuthState) -> Router {
        let router = router.merge(bridge_routes(&state, forward_untouched));
        // layer は後から足したものが外側 = 先に走る
        body_parser::apply(router, state)
    }
}

async fn forward_untouched(
    State(state): State<AuthState>,
    req: Request<Body>,
) -> Result<Response<Body>, AppError> {
    Ok(state.engine.handle(req).await?)
}

#[derive(Debug, Clone, Copy)]
pub struct FastifyStrategy;

impl RoutingStrategy for FastifyStrategy {
    fn provider(&self) -> RoutingProvider {
        RoutingProvider::Fastify
    }

    fn install(&self, router: Router, state: AuthState) -> Router {
        router.merge(bridge_routes(&state, forward_rebuilt))
    }
}

async fn forward_rebuilt(
    State(state): State<AuthState>,
    req: Request<Body>,
) -> Result<Response<Body>, AppError> {
    let req = rebuild_request(req, state.options.max_body_bytes).await?;
    let res = state.engine.handle(req).await?;
    relay_response(res).await
}

/// Build the request the engine sees from the raw incoming one.
pub async fn rebuild_request(req: Request<Body>, limit: usize) -> Result<Request<Body>, AppError> {
    let (parts, body) = req.into_parts();

    let mut headers = HeaderMap::with_capacity(parts.headers.len());
    for (name, value) in parts.headers.iter() {
        if value.is_empty() {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    let bytes = read_capped(body, limit).await?;
    let uri = absolute_uri(&parts.headers, &parts.uri)?;

    let body = if bytes.is_empty() {
        Body::empty()
    } else {
        Body::from(bytes)
    };

    let mut forwarded = Request::new(body);
    *forwarded.method_mut() = parts.method;
    *forwarded.uri_mut() = uri;
    *forwarded.headers_mut() = headers;
    Ok(forwarded)
}

/// `http://{Host}{path?query}`. A request without `Host` is addressed to `localhost`.
///
/// The path and query are copied as received (no dot-segment resolution).
fn absolute_uri(headers: &HeaderMap, original: &Uri) -> Result<Uri, AppError> {
    let authority = match headers.get(header::HOST) {
        Some(value) => host_authority(value.as_bytes())?,
        None => original
            .authority()
            .cloned()
            .unwrap_or_else(|| Authority::from_static("localhost")),
    };

    let mut builder = Uri::builder().scheme("http").authority(authority);
    builder = match original.path_and_query() {
        Some(pq) => builder.path_and_query(pq.clone()),
        None => builder.path_and_query("/"),
    };

    builder.build().map_err(|err| {
        tracing::warn!(error = %err, "cannot build auth request url");
        AppError::bad_request("INVALID_HOST", "invalid host header")
    })
}

/// `host[:port]` only: no path, query, fragment or userinfo.
fn host_authority(raw: &[u8]) -> Result<Authority, AppError> {
    let invalid = || {
        tracing::warn!(host = %String::from_utf8_lossy(raw), "rejected host header");
        AppError::bad_request("INVALID_HOST", "invalid host header")
    };

    if raw.is_empty() || raw.contains(&b'@') {
        return Err(invalid());
    }
    Authority::try_from(raw).map_err(|_| invalid())
}

/// Copy status, headers, and the body (as text) into a fresh response.
pub async fn relay_response(res: Response<Body>) -> Result<Response<Body>, AppError> {
    let (parts, body) = res.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.map_err(|err| {
        tracing::error!(error = %err, "failed to read engine response");
        AppError::Internal
    })?;

    let text = String::from_utf8_lossy(&bytes);
    // 不正な UTF-8 が置換されたら長さが変わる
    let lossy = matches!(text, Cow::Owned(_));

    let body = if text.is_empty() {
        Body::empty()
    } else {
        Body::from(text.into_owned())
    };

    let mut reply = Response::new(body);
    *reply.status_mut() = parts.status;
    *reply.headers_mut() = parts.headers;
    if lossy {
        reply.headers_mut().remove(header::CONTENT_LENGTH);
    }
    Ok(reply)
}
