/*
 * Responsibility
 * - Auth module の登録 (for_root / for_root_async)
 * - engine handle と options を container に export する
 * - 起動時に 1 回だけ auth pipeline を Router に組み込む (configure)
 */
use std::future::Future;
use std::sync::Arc;

use axum::Router;

use crate::error::ModuleError;
use crate::middleware::auth::{AuthGuard, RouteMetadata, strategy_for};
use crate::services::container::{Container, Inject};
use crate::services::engine::EngineHandle;
use crate::state::AuthState;
use crate::tokens::{AUTH_MODULE_OPTIONS_TOKEN, BETTER_AUTH_INSTANCE_TOKEN};
use crate::types::{AdapterOptions, AsyncAuthModuleOptions, AuthModuleOptions};

/// One registration of the auth engine. Cheap to clone; everything inside is shared.
#[derive(Debug, Clone)]
pub struct AuthModule {
    engine: EngineHandle,
    options: Arc<AdapterOptions>,
}

impl AuthModule {
    pub fn for_root(opts: AuthModuleOptions) -> Self {
        Self {
            engine: opts.engine,
            options: Arc::new(opts.options),
        }
    }

    /// Resolve the factory's dependencies from `container`, run it once, register.
    ///
    /// ```ignore
    /// let module = AuthModule::for_root_async(
    ///     &container,
    ///     AsyncAuthModuleOptions::new(|(config,): (Config,)| async move {
    ///         let engine = build_engine(&config).await;
    ///         Ok(AuthModuleOptions::new(EngineHandle::new(engine), config.adapter_options()))
    ///     }),
    /// )
    /// .await?;
    /// ```
    pub async fn for_root_async<D, F, Fut>(
        container: &Container,
        opts: AsyncAuthModuleOptions<F>,
    ) -> Result<Self, ModuleError>
    where
        D: Inject,
        F: FnOnce(D) -> Fut,
        Fut: Future<Output = Result<AuthModuleOptions, ModuleError>>,
    {
        let deps = D::inject(container)?;
        let resolved = (opts.use_factory)(deps).await?;
        Ok(Self::for_root(resolved))
    }

    /// Make the engine handle and options injectable for the rest of the app.
    pub fn exports(&self, container: &mut Container) {
        container.provide(BETTER_AUTH_INSTANCE_TOKEN, self.engine.clone());
        container.provide(AUTH_MODULE_OPTIONS_TOKEN, self.options.clone());
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    pub fn guard(&self, metadata: RouteMetadata) -> AuthGuard {
        AuthGuard::new(self.engine.clone(), metadata)
    }

    /// Install the auth pipeline for the configured routing provider.
    ///
    /// Call once, after the guard has been applied to the application routes.
    pub fn configure(&self, router: Router) -> Result<Router, ModuleError> {
        let provider = self
            .options
            .routing_provider
            .ok_or(ModuleError::MissingRoutingProvider)?;

        let state = AuthState::new(self.engine.clone(), self.options.clone())?;
        let base_path = state.base_path.clone();
        let strategy = strategy_for(provider);
        let router = strategy.install(router, state);

        tracing::info!(
            provider = %strategy.provider(),
            base_path = %base_path,
            json_parser = self.options.json_parser,
            "auth module initialized"
        );
        Ok(router)
    }
}
