//! Error types for the prediction bot

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("Formatting error: {0}")]
    Format(String),

    #[error("Unexpected API response: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BotError::Config("TELEGRAM_BOT_TOKEN is not set".to_string());
        assert_eq!(err.to_string(), "Config error: TELEGRAM_BOT_TOKEN is not set");

        let err = BotError::Telegram("Bad Request: message to delete not found".to_string());
        assert!(err.to_string().contains("message to delete not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: BotError = parse.unwrap_err().into();
        assert!(matches!(err, BotError::Json(_)));
    }
}
