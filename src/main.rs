use anyhow::Context;
use clap::Parser;
use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use seat_watcher::{
    chairmap_client::ChairmapClient,
    config::{Config, LogFormat},
    services::bot::run_bot,
    telegram::TelegramClient,
    AppState,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Подробные логи (перекрывает RUST_LOG)
    #[arg(long)]
    debug: bool,
}

fn init_tracing(config: &Config, debug: bool) {
    let filter = if debug {
        EnvFilter::new("seat_watcher=debug")
    } else {
        EnvFilter::new(&config.app.rust_log)
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env();

    init_tracing(&config, cli.debug);

    info!("🎭 Starting seat watcher ({})", config.app.environment);

    let token = config
        .telegram
        .bot_token
        .clone()
        .context("BOT_TOKEN environment variable is not set")?;

    let chairmap = ChairmapClient::from_config(&config.chairmap).context("Failed to build chairmap client")?;
    let telegram = TelegramClient::from_config(&config.telegram, &token)
        .context("Failed to build Telegram client")?;

    let state = AppState::new(config, Arc::new(chairmap), Arc::new(telegram.clone()));
    info!("📂 Subscription store: {}", state.store.path().display());

    // Возобновляем мониторинг всего, что было сохранено до перезапуска
    state.subscriptions.resume_all().await;

    let cancel = CancellationToken::new();
    let bot = tokio::spawn(run_bot(telegram, state.dialogue.clone(), cancel.clone()));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Shutdown signal received");

    cancel.cancel();
    state.subscriptions.shutdown().await;
    if let Err(e) = bot.await {
        tracing::error!("Bot task failed: {}", e);
    }

    info!("👋 Seat watcher stopped");
    Ok(())
}
