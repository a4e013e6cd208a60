//! Bot configuration
//!
//! Values are layered from built-in defaults, an optional TOML file and the
//! process environment (a `.env` file is loaded first when present).

use crate::error::{BotError, Result};
use config::{Environment, File};
use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "https://binancedata-api.onrender.com";
pub const DEFAULT_DB_PATH: &str = "data/predictions.db";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the prediction API
    pub api_base: String,
    /// Predictions each user may request per UTC day
    pub default_daily_limit: i64,
    /// Consumed predictions forgiven for every successful referral
    pub referral_bonus: i64,
    /// Token issued by BotFather
    #[serde(default)]
    pub telegram_bot_token: String,
    /// Port for the health check server
    pub port: u16,
    /// SQLite file holding user quotas
    pub db_path: String,
}

impl Config {
    /// Load configuration from `.env`, an optional config file and the environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_sources(path, Environment::default())
    }

    pub(crate) fn from_sources(path: Option<&str>, env: Environment) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("api_base", DEFAULT_API_BASE)?
            .set_default("default_daily_limit", 10)?
            .set_default("referral_bonus", 5)?
            .set_default("telegram_bot_token", "")?
            .set_default("port", 8080)?
            .set_default("db_path", DEFAULT_DB_PATH)?;

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let config: Config = builder
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Check the settings the bot cannot start without
    pub fn validate(&self) -> Result<()> {
        if self.telegram_bot_token.trim().is_empty() {
            return Err(BotError::Config(
                "TELEGRAM_BOT_TOKEN is not set".to_string(),
            ));
        }
        if self.default_daily_limit < 0 {
            return Err(BotError::Config(format!(
                "DEFAULT_DAILY_LIMIT must not be negative (got {})",
                self.default_daily_limit
            )));
        }
        if self.referral_bonus < 0 {
            return Err(BotError::Config(format!(
                "REFERRAL_BONUS must not be negative (got {})",
                self.referral_bonus
            )));
        }
        Ok(())
    }
}
