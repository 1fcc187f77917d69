/// Factory: build the development engine from application `Config`.
use chrono::Duration;

use crate::config::Config;
use crate::services::engine::InMemoryEngine;
use crate::types::{User, UserSession};

pub async fn build_engine(config: &Config) -> InMemoryEngine {
    let engine = InMemoryEngine::new().with_base_path(config.auth_base_path.clone());

    // AUTH_DEMO_TOKEN があれば、その token で demo user の session を作っておく
    if let Some(token) = config.auth_demo_token.as_deref() {
        let user = User::new("demo-user")
            .with_email("demo@example.com")
            .with_name("Demo User");
        engine
            .insert_session(UserSession::new(user, token, Duration::days(1)))
            .await;
        tracing::info!("seeded demo session");
    }

    engine
}
