/*
 * Responsibility
 * - Config読み込み → container / AuthModule 生成 → Router 組み立て
 * - Middleware の適用 (guard → auth pipeline → CORS → HTTP)
 * - axum::serve() で起動
 */
use std::panic;
use std::process;

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::ModuleError;
use crate::middleware::{cors, http};
use crate::module::AuthModule;
use crate::services::{Container, EngineHandle, engine::build_engine};
use crate::types::{AsyncAuthModuleOptions, AuthModuleOptions};

fn init_tracing() {
    // RUST_LOG があればそれを優先
    // Ex: RUST_LOG=info,auth_bridge=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr が見えない起動方法でも panic を tracing に残す
        tracing::error!(?info, "panic");

        // development は即落として気付けるようにする
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting auth bridge in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let mut container = Container::new();
    container.provide("CONFIG", config.clone());

    let module = register_auth(&container).await?;
    module.exports(&mut container);
    tracing::debug!(?container, "providers registered");

    let app = build_router(&module, &config)?;

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn register_auth(container: &Container) -> Result<AuthModule, ModuleError> {
    AuthModule::for_root_async(
        container,
        AsyncAuthModuleOptions::new(|(config,): (Config,)| async move {
            let engine = build_engine(&config).await;
            Ok(AuthModuleOptions::new(
                EngineHandle::new(engine),
                config.adapter_options(),
            ))
        }),
    )
    .await
}

/// App routes (guarded) + auth routes (engine) + outer HTTP layers.
pub fn build_router(module: &AuthModule, config: &Config) -> Result<Router, ModuleError> {
    let app = module.guard(api::v1::metadata()).apply(api::v1::routes());
    let app = module.configure(app)?;
    let app = cors::apply(app, config);
    Ok(http::apply(app, config.request_timeout))
}
