//! Scripted engine for unit tests.
use std::sync::Mutex;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes, HttpBody, to_bytes},
    http::{HeaderMap, Method, Request, Response, StatusCode, Uri},
};

use super::{AuthEngine, EngineError, EngineResult};
use crate::types::UserSession;

/// What the engine observed for one `handle` call.
#[derive(Debug, Clone)]
pub(crate) struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub body_was_empty_stream: bool,
}

#[derive(Default)]
pub(crate) struct ScriptedEngine {
    pub base_path: Option<String>,
    pub session: Option<UserSession>,
    pub fail_session: bool,
    pub status: Option<StatusCode>,
    pub response_headers: Vec<(&'static str, &'static str)>,
    pub response_body: Option<&'static str>,
    pub captured: Mutex<Vec<Captured>>,
}

impl ScriptedEngine {
    pub fn with_session(session: UserSession) -> Self {
        Self {
            session: Some(session),
            ..Self::default()
        }
    }

    pub fn last(&self) -> Option<Captured> {
        self.captured.lock().unwrap().last().cloned()
    }

    pub fn calls(&self) -> usize {
        self.captured.lock().unwrap().len()
    }
}

#[async_trait]
impl AuthEngine for ScriptedEngine {
    fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    async fn get_session(&self, _headers: &HeaderMap) -> EngineResult<Option<UserSession>> {
        if self.fail_session {
            return Err(EngineError::Session("store unavailable".into()));
        }
        Ok(self.session.clone())
    }

    async fn handle(&self, req: Request<Body>) -> EngineResult<Response<Body>> {
        let (parts, body) = req.into_parts();
        let body_was_empty_stream = body.is_end_stream();
        let body = to_bytes(body, usize::MAX)
            .await
            .map_err(|e| EngineError::Handler(e.to_string()))?;
        self.captured.lock().unwrap().push(Captured {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            body_was_empty_stream,
        });

        let mut builder = Response::builder().status(self.status.unwrap_or(StatusCode::OK));
        for (name, value) in &self.response_headers {
            builder = builder.header(*name, *value);
        }
        let body = match self.response_body {
            Some(text) => Body::from(text),
            None => Body::empty(),
        };
        builder
            .body(body)
            .map_err(|e| EngineError::Handler(e.to_string()))
    }
}
