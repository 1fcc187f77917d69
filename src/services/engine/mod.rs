//! Authentication engine boundary.
//!
//! The adapter never verifies credentials or issues sessions itself. It only needs
//! two capabilities from the wrapped engine:
//! - resolve a session from request headers
//! - answer a raw HTTP request addressed to its own routes (`/auth/...`)
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request, Response},
};
use thiserror::Error;

use crate::types::UserSession;

pub mod factory;
pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

pub use factory::build_engine;
pub use memory::InMemoryEngine;

pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-side failures. The adapter does not retry or swallow these.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("session lookup failed: {0}")]
    Session(String),
    #[error("request handling failed: {0}")]
    Handler(String),
}

#[async_trait]
pub trait AuthEngine: Send + Sync + 'static {
    /// Prefix of the engine's own routes. `None` means the default (`/auth`).
    fn base_path(&self) -> Option<&str> {
        None
    }

    async fn get_session(&self, headers: &HeaderMap) -> EngineResult<Option<UserSession>>;

    async fn handle(&self, req: Request<Body>) -> EngineResult<Response<Body>>;
}

/// Shared, cheap-to-clone handle to the single engine instance.
#[derive(Clone)]
pub struct EngineHandle(Arc<dyn AuthEngine>);

impl EngineHandle {
    pub fn new(engine: impl AuthEngine) -> Self {
        Self(Arc::new(engine))
    }

    pub fn from_arc(engine: Arc<dyn AuthEngine>) -> Self {
        Self(engine)
    }
}

impl Deref for EngineHandle {
    type Target = dyn AuthEngine;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("base_path", &self.0.base_path())
            .finish()
    }
}
