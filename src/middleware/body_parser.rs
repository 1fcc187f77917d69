//! Body parsing for non-auth routes (express provider).
//!
//! The engine must read an untouched body on its own routes, so nothing upstream
//! parses bodies globally. With `json_parser: true` this middleware restores
//! parsing everywhere else:
//! - `application/json` (and `+json`) first, then
//! - `application/x-www-form-urlencoded`.
//!
//! The parsed value goes into `ParsedBody`; the raw bytes are put back so `Json` /
//! `Form` extractors still work. Parse errors stop the request with 400.

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};
use serde_json::{Map, Value};

use super::body::read_capped;
use crate::error::AppError;
use crate::state::AuthState;

/// Parsed request body, inserted into request extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBody(pub Value);

pub fn apply(router: Router, state: AuthState) -> Router {
    router.layer(middleware::from_fn_with_state(state, reparse_body))
}

async fn reparse_body(
    State(state): State<AuthState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // auth routes は engine が raw body を読むので触らない
    if state.is_auth_path(req.uri().path()) || !state.options.json_parser {
        return Ok(next.run(req).await);
    }

    let limit = state.options.max_body_bytes;
    let req = parse_json(req, limit).await?;
    let req = parse_urlencoded(req, limit).await?;

    Ok(next.run(req).await)
}

fn essence(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
}

fn is_json(headers: &HeaderMap) -> bool {
    essence(headers).is_some_and(|e| e == "application/json" || e.ends_with("+json"))
}

fn is_urlencoded(headers: &HeaderMap) -> bool {
    essence(headers).is_some_and(|e| e == "application/x-www-form-urlencoded")
}

async fn buffer(req: Request<Body>, limit: usize) -> Result<(Request<Body>, Bytes), AppError> {
    let (parts, body) = req.into_parts();
    let bytes = read_capped(body, limit).await?;
    let req = Request::from_parts(parts, Body::from(bytes.clone()));
    Ok((req, bytes))
}

async fn parse_json(req: Request<Body>, limit: usize) -> Result<Request<Body>, AppError> {
    if !is_json(req.headers()) {
        return Ok(req);
    }

    let (mut req, bytes) = buffer(req, limit).await?;
    let value = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        let value: Value = serde_json::from_slice(&bytes).map_err(|err| {
            tracing::warn!(error = %err, "malformed json body");
            AppError::bad_request("INVALID_JSON", err.to_string())
        })?;
        // strict: top-level は object / array のみ
        if !(value.is_object() || value.is_array()) {
            return Err(AppError::bad_request(
                "INVALID_JSON",
                "json body must be an object or an array",
            ));
        }
        value
    };

    req.extensions_mut().insert(ParsedBody(value));
    Ok(req)
}

async fn parse_urlencoded(req: Request<Body>, limit: usize) -> Result<Request<Body>, AppError> {
    if !is_urlencoded(req.headers()) {
        return Ok(req);
    }

    let (mut req, bytes) = buffer(req, limit).await?;
    req.extensions_mut()
        .insert(ParsedBody(Value::Object(form_to_map(&bytes))));
    Ok(req)
}

/// Repeated keys collect into an array, in arrival order.
fn form_to_map(bytes: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        let value = Value::String(value.into_owned());
        match map.get_mut(&*key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    map
}
