//! Route metadata side-table.
//!
//! Markers are keyed by route identity rather than attached to handlers, so the
//! guard can look them up before the handler runs. Lookup order:
//! 1. handler scope: `(method, route path)`
//! 2. controller scope: the longest registered route prefix containing the path
//!
//! The first scope that has the key wins.
use std::collections::HashMap;

use axum::http::Method;

use crate::state::is_under;
use crate::tokens::IS_PUBLIC_KEY;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HandlerKey {
    method: Method,
    path: String,
    key: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct RouteMetadata {
    handlers: HashMap<HandlerKey, bool>,
    controllers: Vec<(String, &'static str, bool)>,
}

impl RouteMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one handler as public. `path` is the route pattern, e.g. `/posts/{id}`.
    pub fn public_handler(self, method: Method, path: impl Into<String>) -> Self {
        self.handler(method, path, IS_PUBLIC_KEY, true)
    }

    /// Mark every route under `prefix` as public.
    pub fn public_controller(self, prefix: impl Into<String>) -> Self {
        self.controller(prefix, IS_PUBLIC_KEY, true)
    }

    pub fn handler(
        mut self,
        method: Method,
        path: impl Into<String>,
        key: &'static str,
        value: bool,
    ) -> Self {
        let key = HandlerKey {
            method,
            path: path.into(),
            key,
        };
        self.handlers.insert(key, value);
        self
    }

    pub fn controller(mut self, prefix: impl Into<String>, key: &'static str, value: bool) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_end_matches('/').to_string();
        self.controllers.retain(|(p, k, _)| !(p == &prefix && *k == key));
        self.controllers.push((prefix, key, value));
        self
    }

    /// Handler value if set, otherwise the closest controller value.
    pub fn get_all_and_override(&self, key: &'static str, method: &Method, path: &str) -> Option<bool> {
        let handler_key = HandlerKey {
            method: method.clone(),
            path: path.to_string(),
            key,
        };
        if let Some(value) = self.handlers.get(&handler_key) {
            return Some(*value);
        }

        self.controllers
            .iter()
            .filter(|(prefix, k, _)| *k == key && (prefix.is_empty() || is_under(path, prefix)))
            .max_by_key(|(prefix, _, _)| prefix.len())
            .map(|(_, _, value)| *value)
    }

    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        self.get_all_and_override(IS_PUBLIC_KEY, method, path)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmarked_routes_are_private() {
        let meta = RouteMetadata::new();
        assert!(!meta.is_public(&Method::GET, "/private"));
        assert_eq!(meta.get_all_and_override(IS_PUBLIC_KEY, &Method::GET, "/private"), None);
    }

    #[test]
    fn handler_marker_is_method_specific() {
        let meta = RouteMetadata::new().public_handler(Method::GET, "/public");
        assert!(meta.is_public(&Method::GET, "/public"));
        assert!(!meta.is_public(&Method::POST, "/public"));
    }

    #[test]
    fn handler_scope_overrides_controller_scope() {
        let meta = RouteMetadata::new()
            .controller("/admin", IS_PUBLIC_KEY, false)
            .public_handler(Method::GET, "/admin/status");
        assert!(meta.is_public(&Method::GET, "/admin/status"));
        assert!(!meta.is_public(&Method::GET, "/admin/users"));

        let meta = RouteMetadata::new()
            .public_controller("/docs")
            .handler(Method::GET, "/docs/internal", IS_PUBLIC_KEY, false);
        assert!(!meta.is_public(&Method::GET, "/docs/internal"));
        assert!(meta.is_public(&Method::GET, "/docs/intro"));
    }

    #[test]
    fn closest_controller_wins() {
        let meta = RouteMetadata::new()
            .public_controller("/api")
            .controller("/api/billing/", IS_PUBLIC_KEY, false);
        assert!(meta.is_public(&Method::GET, "/api/health"));
        assert!(!meta.is_public(&Method::GET, "/api/billing/invoices"));
        assert!(!meta.is_public(&Method::GET, "/apiary"));
    }

    #[test]
    fn keys_do_not_collide() {
        let meta = RouteMetadata::new().handler(Method::GET, "/x", "ROLES_ADMIN", true);
        assert!(!meta.is_public(&Method::GET, "/x"));
        assert_eq!(
            meta.get_all_and_override("ROLES_ADMIN", &Method::GET, "/x"),
            Some(true)
        );
    }
}
