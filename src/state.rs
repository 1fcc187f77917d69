/*
 * Responsibility
 * - auth pipeline の middleware / bridge が共有するコンテキスト (AuthState)
 *   - engine handle, adapter options, 正規化済み base path
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::error::ModuleError;
use crate::services::engine::EngineHandle;
use crate::tokens::DEFAULT_BASE_PATH;
use crate::types::AdapterOptions;

#[derive(Clone, Debug)]
pub struct AuthState {
    pub engine: EngineHandle,
    pub options: Arc<AdapterOptions>,
    pub base_path: Arc<str>,
}

impl AuthState {
    pub fn new(engine: EngineHandle, options: Arc<AdapterOptions>) -> Result<Self, ModuleError> {
        let base_path = normalize_base_path(engine.base_path())?;
        Ok(Self {
            engine,
            options,
            base_path: base_path.into(),
        })
    }

    pub fn is_auth_path(&self, path: &str) -> bool {
        is_under(path, &self.base_path)
    }
}

/// `None`/empty falls back to `/auth`; a trailing slash is dropped.
///
/// `/` is rejected: every request would become an engine request.
pub fn normalize_base_path(raw: Option<&str>) -> Result<String, ModuleError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let Some(raw) = raw else {
        return Ok(DEFAULT_BASE_PATH.to_string());
    };

    let trimmed = raw.trim_end_matches('/');
    if !raw.starts_with('/') || trimmed.is_empty() || trimmed.contains(['?', '#', '{', '}']) {
        return Err(ModuleError::InvalidBasePath(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Segment-aware prefix match: `/auth` and `/auth/x` match `/auth`, `/authors` does not.
pub fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_defaults_and_normalizes() {
        assert_eq!(normalize_base_path(None).unwrap(), "/auth");
        assert_eq!(normalize_base_path(Some("  ")).unwrap(), "/auth");
        assert_eq!(normalize_base_path(Some("/api/auth/")).unwrap(), "/api/auth");
    }

    #[test]
    fn base_path_rejects_root_and_relative() {
        assert!(matches!(
            normalize_base_path(Some("/")),
            Err(ModuleError::InvalidBasePath(_))
        ));
        assert!(normalize_base_path(Some("auth")).is_err());
        assert!(normalize_base_path(Some("/auth?x=1")).is_err());
    }

    #[test]
    fn prefix_match_respects_segments() {
        assert!(is_under("/auth", "/auth"));
        assert!(is_under("/auth/sign-in/email", "/auth"));
        assert!(!is_under("/authors", "/auth"));
        assert!(!is_under("/api/auth", "/auth"));
    }
}
