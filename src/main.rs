//! Granxy store bot
//!
//! Lets a single operator publish and manage app-store listings through a
//! Telegram chat, driven by a conversation state machine.

mod catalog;
mod config;
mod db;
mod runtime;
mod state_machine;
mod telegram;

use config::BotConfig;
use db::Database;
use runtime::{DatabaseStorage, ProductionPoller, ProductionRuntime};
use std::sync::Arc;
use telegram::TelegramClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "granxy_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let api = Arc::new(TelegramClient::new(&config)?);
    let retry_delay = config.retry_delay;
    tracing::info!(operator = %config.operator, api_base = %config.api_base, "Starting bot");

    let runtime = ProductionRuntime::start(config, api.clone(), DatabaseStorage::new(db)).await?;
    let poller = ProductionPoller::new(api, runtime, retry_delay);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
                cancel.cancel();
            }
        }
    });

    poller.run(cancel).await;
    Ok(())
}
