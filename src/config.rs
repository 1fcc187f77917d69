/*
 * Responsibility
 * - 環境変数の読み込み (PORT, APP_ENV, AUTH_* など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 * - AdapterOptions の組み立て
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::tokens::DEFAULT_BASE_PATH;
use crate::types::{AdapterOptions, DEFAULT_MAX_BODY_BYTES, RoutingProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,

    pub routing_provider: RoutingProvider,
    pub json_parser: bool,
    pub auth_base_path: String,
    pub max_body_bytes: usize,
    // dev only: bearer token seeded into the in-memory engine
    pub auth_demo_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_source<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV"));

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_timeout = match get("REQUEST_TIMEOUT_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"))?,
            None => Duration::from_secs(30),
        };

        // 未知の provider は起動時に落とす (リクエスト単位のエラーにはしない)
        let routing_provider = get("AUTH_ROUTING_PROVIDER")
            .ok_or(ConfigError::Missing("AUTH_ROUTING_PROVIDER"))?
            .parse::<RoutingProvider>()
            .map_err(|_| ConfigError::Invalid("AUTH_ROUTING_PROVIDER"))?;

        let json_parser = match get("AUTH_JSON_PARSER") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid("AUTH_JSON_PARSER"))?,
            None => false,
        };

        let auth_base_path = get("AUTH_BASE_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string());

        let max_body_bytes = match get("AUTH_MAX_BODY_BYTES") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid("AUTH_MAX_BODY_BYTES"))?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        let auth_demo_token = get("AUTH_DEMO_TOKEN").filter(|s| !s.trim().is_empty());

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            request_timeout,
            routing_provider,
            json_parser,
            auth_base_path,
            max_body_bytes,
            auth_demo_token,
        })
    }

    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions::new(self.routing_provider)
            .with_json_parser(self.json_parser)
            .with_max_body_bytes(self.max_body_bytes)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
