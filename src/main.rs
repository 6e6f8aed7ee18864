use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whisperbot::{
    bot::Bot,
    config::{AppConfig, DatabaseConfig},
    db::{self, DbPool, MemoryWhisperStore, SqliteWhisperStore, WhisperStore},
    telegram::TelegramClient,
    web,
};

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "whisperbot=debug,tower_http=debug".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Open the configured whisper store. Returns the pool too so it can be
/// closed on shutdown.
async fn open_store(
    config: &DatabaseConfig,
) -> anyhow::Result<(Arc<dyn WhisperStore>, Option<DbPool>)> {
    if config.is_memory() {
        warn!("Using in-memory whisper store; whispers are lost on restart");
        return Ok((Arc::new(MemoryWhisperStore::new()), None));
    }

    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await?;
    info!("Database connected: {}", config.url);

    // Run migrations
    db::init_db(&pool).await?;

    Ok((Arc::new(SqliteWhisperStore::new(pool.clone())), Some(pool)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration before logging so the output format can be chosen
    let config = AppConfig::load()?;
    init_tracing(config.logging.json);

    info!("Starting WhisperBot v{}", env!("CARGO_PKG_VERSION"));

    if config.telegram.token.is_empty() {
        error!("Telegram bot token not configured!");
        error!("Set telegram.token in config/default.toml or WHISPERBOT_TELEGRAM__TOKEN env var");
        return Err(anyhow::anyhow!("Telegram bot token not configured"));
    }

    if config.audit.operator_ids.is_empty() {
        info!("No audit operators configured");
    } else {
        info!("Audit copies go to {} operator(s)", config.audit.operator_ids.len());
    }

    let (store, pool) = open_store(&config.database).await?;

    let api = Arc::new(TelegramClient::new(&config.telegram)?);
    let bot = Arc::new(Bot::new(api.clone(), store, &config));

    // Set webhook
    match config.telegram.webhook_url() {
        Some(url) => {
            api.set_webhook(&url).await?;
            let base = config.telegram.webhook_base_url.as_deref().unwrap_or_default();
            info!("Webhook set to {}/webhook/<token>", base);
        }
        None => warn!("telegram.webhook_base_url not set; leaving webhook registration unchanged"),
    }

    let state = web::AppState {
        bot,
        webhook_token: Arc::from(config.telegram.token.as_str()),
    };
    let app = web::create_router(state);

    let web_addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = TcpListener::bind(&web_addr).await?;
    info!("Web server listening on http://{}", web_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        pool.close().await;
        info!("Database pool closed");
    }

    info!("WhisperBot shut down gracefully");
    Ok(())
}
