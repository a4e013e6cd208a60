//! Remote prediction API access

pub mod prediction;

pub use prediction::{fallback_symbols, PredictionClient, FALLBACK_SYMBOLS};

use async_trait::async_trait;
use serde_json::Value;

/// Source of predictions and the supported symbol whitelist.
///
/// Neither method fails: transport and decoding errors are logged and
/// collapse to "no prediction" or the fallback whitelist.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionSource: Send + Sync {
    /// Raw prediction payload for `symbol`, or `None` when unavailable
    async fn fetch_prediction(&self, symbol: &str, timeframe: &str) -> Option<Value>;

    /// Trading pairs the API currently supports
    async fn fetch_valid_symbols(&self) -> Vec<String>;
}
