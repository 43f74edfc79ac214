use anyhow::Context;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod notes;
mod state;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "devnotes=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Settings are read exactly once; anything missing or malformed aborts
    // startup here, not at first use.
    let config = AppConfig::from_env().context("invalid configuration")?;

    let pool = db::connect(&config.db)
        .await
        .context("failed to open database pool")?;
    db::ping(&pool).await.context("database unreachable")?;
    tracing::info!(
        pool_size = config.db.pool_size,
        max_overflow = config.db.max_overflow,
        "database connected"
    );

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let state = AppState::new(config, pool);
    let app = app::build_app(state);
    app::serve(app).await
}
