/*
 * Responsibility
 * - auth engine を axum app に組み込む adapter の公開 API
 *   - AuthModule (for_root / for_root_async / configure)
 *   - AuthGuard + RouteMetadata (public route の宣言)
 *   - CurrentUser / Session extractors
 * - demo server (app::run) もここから辿れる
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod module;
pub mod services;
pub mod state;
pub mod tokens;
pub mod types;

pub use error::{AppError, ModuleError};
pub use extractors::{CurrentUser, Session};
pub use middleware::auth::{AuthGuard, RouteMetadata};
pub use module::AuthModule;
pub use services::{AuthEngine, Container, EngineHandle, Inject};
pub use types::{
    AdapterOptions, AsyncAuthModuleOptions, AuthModuleOptions, RoutingProvider, User,
    UserSession,
};
