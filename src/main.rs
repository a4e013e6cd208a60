//! Crypto Prediction Bot
//!
//! Telegram bot that relays trading-pair predictions with per-user daily quotas.

use clap::{Parser, Subcommand};
use crypto_predict_bot::{
    client::{PredictionClient, PredictionSource},
    config::Config,
    dispatcher::{Dispatcher, TIMEFRAME},
    format::format_prediction,
    monitor::start_health_server,
    storage::{today, QuotaStore},
    telegram::TelegramBot,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const UPDATE_QUEUE: usize = 100;

#[derive(Parser)]
#[command(name = "crypto-predict-bot")]
#[command(about = "Telegram bot for crypto price predictions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot and the health server
    Run,
    /// Fetch and print a prediction without touching quotas
    Predict {
        /// Trading pair, e.g. BTCUSDT
        symbol: String,
        #[arg(short, long, default_value = TIMEFRAME)]
        interval: String,
    },
    /// Show a user's stored quota record
    Quota {
        user_id: i64,
    },
    /// List the supported trading pairs
    Symbols,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = Config::load(Some(&cli.config))?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_bot(config).await,
        Commands::Predict { symbol, interval } => show_prediction(config, &symbol, &interval).await,
        Commands::Quota { user_id } => show_quota(config, user_id).await,
        Commands::Symbols => show_symbols(config).await,
    }
}

async fn run_bot(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    tracing::info!("🚀 Starting Crypto Prediction Bot");
    tracing::info!("Prediction API: {}", config.api_base);
    tracing::info!(
        "Daily limit: {}, referral bonus: {}",
        config.default_daily_limit,
        config.referral_bonus
    );

    let store = Arc::new(
        QuotaStore::open(&config.db_path, config.default_daily_limit, config.referral_bonus).await?,
    );
    let predictions = Arc::new(PredictionClient::new(&config.api_base)?);
    let bot = Arc::new(TelegramBot::new(config.telegram_bot_token.clone())?);

    let me = bot.get_me().await?;
    let bot_username = me
        .username
        .ok_or_else(|| anyhow::anyhow!("bot account has no username"))?;
    tracing::info!("Logged in as @{}", bot_username);

    let dispatcher = Arc::new(Dispatcher::new(
        bot.clone(),
        predictions,
        store.clone(),
        bot_username,
    ));

    let health_store = store.clone();
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = start_health_server(health_store, port).await {
            tracing::error!("Health server stopped: {}", e);
        }
    });

    let (update_tx, update_rx) = mpsc::channel(UPDATE_QUEUE);
    let poller = tokio::spawn(bot.clone().start_polling(update_tx));

    tracing::info!("✅ Bot is running. Press Ctrl+C to stop.");

    dispatcher
        .run(update_rx, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down...");
        })
        .await;

    poller.abort();
    store.close().await;

    Ok(())
}

async fn show_prediction(config: Config, symbol: &str, interval: &str) -> anyhow::Result<()> {
    let client = PredictionClient::new(&config.api_base)?;
    let symbol = symbol.trim().to_uppercase();

    match client.fetch_prediction(&symbol, interval).await {
        Some(payload) => {
            println!(
                "{}",
                format_prediction(&payload, &symbol, interval, config.default_daily_limit)
            );
        }
        None => println!("No prediction available for {}", symbol),
    }

    Ok(())
}

async fn show_quota(config: Config, user_id: i64) -> anyhow::Result<()> {
    let store = QuotaStore::open(&config.db_path, config.default_daily_limit, config.referral_bonus).await?;

    match store.user_stats(user_id).await? {
        Some(record) => {
            println!("User:          {}", record.user_id);
            println!("Used today:    {}", record.daily_used);
            println!("Referrals:     {}", record.referrals);
            println!("Last updated:  {}", record.last_updated);
            println!(
                "Remaining:     {}",
                record.remaining_on(store.daily_limit(), today())
            );
        }
        None => println!("No record for user {}", user_id),
    }

    store.close().await;
    Ok(())
}

async fn show_symbols(config: Config) -> anyhow::Result<()> {
    let client = PredictionClient::new(&config.api_base)?;
    let symbols = client.fetch_valid_symbols().await;

    println!("{} supported pairs:", symbols.len());
    for symbol in symbols {
        println!("  {}", symbol);
    }

    Ok(())
}
