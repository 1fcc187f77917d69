/*
 * Responsibility
 * - Adapter options (routing provider / json parser / body cap)
 * - Module 登録時の options (static / factory)
 * - Engine から返る session / user の型
 *
 * Notes
 * - Engine 固有のフィールド (plugin が追加する role など) は `extra` に残す
 */
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::services::engine::EngineHandle;

/// Default cap for buffered request bodies (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// HTTP runtime the auth routes are bridged for.
///
/// - `Express`: callback-style; the request is forwarded to the engine as-is.
/// - `Fastify`: stream-based; the request is rebuilt from its raw parts and a
///   fully drained body before the engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingProvider {
    Express,
    Fastify,
}

impl RoutingProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Express => "express",
            Self::Fastify => "fastify",
        }
    }
}

impl fmt::Display for RoutingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized routing provider: {0}")]
pub struct ParseRoutingProviderError(pub String);

impl FromStr for RoutingProvider {
    type Err = ParseRoutingProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "express" => Ok(Self::Express),
            "fastify" => Ok(Self::Fastify),
            other => Err(ParseRoutingProviderError(other.to_string())),
        }
    }
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Options handed to `AuthModule` at registration. Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterOptions {
    /// Required; `AuthModule::configure` fails when absent.
    #[serde(default)]
    pub routing_provider: Option<RoutingProvider>,
    /// Re-apply JSON / url-encoded parsing on non-auth routes (express only).
    #[serde(default)]
    pub json_parser: bool,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            routing_provider: None,
            json_parser: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl AdapterOptions {
    pub fn new(routing_provider: RoutingProvider) -> Self {
        Self {
            routing_provider: Some(routing_provider),
            ..Self::default()
        }
    }

    pub fn express() -> Self {
        Self::new(RoutingProvider::Express)
    }

    pub fn fastify() -> Self {
        Self::new(RoutingProvider::Fastify)
    }

    pub fn with_json_parser(mut self, enabled: bool) -> Self {
        self.json_parser = enabled;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

/// Options for `AuthModule::for_root`.
#[derive(Debug, Clone)]
pub struct AuthModuleOptions {
    pub engine: EngineHandle,
    pub options: AdapterOptions,
}

impl AuthModuleOptions {
    pub fn new(engine: EngineHandle, options: AdapterOptions) -> Self {
        Self { engine, options }
    }
}

/// Options for `AuthModule::for_root_async`.
///
/// `use_factory` receives its dependencies resolved from the container (see
/// `Inject`) and runs once.
pub struct AsyncAuthModuleOptions<F> {
    pub use_factory: F,
}

impl<F> AsyncAuthModuleOptions<F> {
    pub fn new(use_factory: F) -> Self {
        Self { use_factory }
    }
}

/// Authenticated principal as reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
            email_verified: false,
            image: None,
            extra: Map::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Plugin-provided field, e.g. `role` from an admin plugin.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionRecord {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            token: token.into(),
            expires_at: Utc::now() + ttl,
            extra: Map::new(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// `{ session, user }` pair returned by the engine's session lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    pub session: SessionRecord,
    pub user: User,
}

impl UserSession {
    pub fn new(user: User, token: impl Into<String>, ttl: Duration) -> Self {
        let session = SessionRecord::new(user.id.clone(), token, ttl);
        Self { session, user }
    }
}
