//! Prediction API client
//!
//! Fetches prediction payloads and the supported symbol list.

use super::PredictionSource;
use crate::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const PREDICTION_TIMEOUT: Duration = Duration::from_secs(20);
pub const SYMBOLS_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = "curl/8.4.0";

/// Whitelist used when the API cannot be asked
pub const FALLBACK_SYMBOLS: &[&str] = &[
    // Stablecoin pairs
    "BTCUSDT", "ETHUSDT", "BNBUSDT",
    "BTCUSDC", "ETHUSDC", "BNBUSDC",
    "BTCFDUSD", "ETHFDUSD", "BNBFDUSD",
    // Crypto pairs
    "ETHBTC", "BNBBTC", "LRCETH",
    // Fiat pairs
    "BTCEUR", "ETHEUR", "BNBEUR",
];

#[derive(Debug, Deserialize)]
struct SymbolsResponse {
    #[serde(default)]
    symbols: Vec<String>,
}

/// HTTP client for the prediction API
#[derive(Clone)]
pub struct PredictionClient {
    http: Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a prediction, treating an empty body as no prediction
    pub async fn try_fetch_prediction(&self, symbol: &str, timeframe: &str) -> Result<Option<Value>> {
        let url = format!("{}/predict/{}", self.base_url, symbol);
        let body: Value = self
            .http
            .get(&url)
            .query(&[("interval", timeframe)])
            .header(ACCEPT, "application/json")
            .timeout(PREDICTION_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if is_empty_payload(&body) {
            warn!("Empty prediction received for {}", symbol);
            return Ok(None);
        }

        Ok(Some(body))
    }

    /// Fetch the supported symbol list; an empty list is an error
    pub async fn try_fetch_symbols(&self) -> Result<Vec<String>> {
        let url = format!("{}/symbols", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .timeout(SYMBOLS_TIMEOUT)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(BotError::Api(format!("symbols endpoint returned {}", resp.status())));
        }

        let parsed: SymbolsResponse = resp.json().await?;
        if parsed.symbols.is_empty() {
            return Err(BotError::Api("symbols endpoint returned no symbols".to_string()));
        }

        debug!("Fetched {} supported symbols", parsed.symbols.len());
        Ok(parsed.symbols)
    }
}

#[async_trait]
impl PredictionSource for PredictionClient {
    async fn fetch_prediction(&self, symbol: &str, timeframe: &str) -> Option<Value> {
        match self.try_fetch_prediction(symbol, timeframe).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Error fetching prediction for {}: {}", symbol, e);
                None
            }
        }
    }

    async fn fetch_valid_symbols(&self) -> Vec<String> {
        match self.try_fetch_symbols().await {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!("Failed to fetch symbols, using default list: {}", e);
                fallback_symbols()
            }
        }
    }
}

pub fn fallback_symbols() -> Vec<String> {
    FALLBACK_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Nothing listens on port 1, so requests fail immediately
    const DEAD_URL: &str = "http://127.0.0.1:1";

    #[test]
    fn test_base_url_trailing_slash() {
        let client = PredictionClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_empty_payload_detection() {
        assert!(is_empty_payload(&Value::Null));
        assert!(is_empty_payload(&json!({})));
        assert!(is_empty_payload(&json!([])));
        assert!(is_empty_payload(&json!("")));
        assert!(!is_empty_payload(&json!({"metadata": {}})));
    }

    #[tokio::test]
    async fn test_fetch_prediction_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/predict/BTCUSDT"))
            .and(query_param("interval", "1h"))
            .and(header("user-agent", USER_AGENT))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "price_analysis": {"current": 100}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PredictionClient::new(&server.uri()).unwrap();
        let payload = client.fetch_prediction("BTCUSDT", "1h").await.unwrap();
        assert_eq!(payload["price_analysis"]["current"], json!(100));
    }

    #[tokio::test]
    async fn test_fetch_prediction_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/predict/BTCUSDT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = PredictionClient::new(&server.uri()).unwrap();
        assert!(client.fetch_prediction("BTCUSDT", "1h").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_prediction_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/predict/BTCUSDT"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = PredictionClient::new(&server.uri()).unwrap();
        assert!(client.try_fetch_prediction("BTCUSDT", "1h").await.is_err());
        assert!(client.fetch_prediction("BTCUSDT", "1h").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_prediction_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/predict/BTCUSDT"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = PredictionClient::new(&server.uri()).unwrap();
        assert!(client.fetch_prediction("BTCUSDT", "1h").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_prediction_network_error() {
        let client = PredictionClient::new(DEAD_URL).unwrap();
        assert!(client.fetch_prediction("BTCUSDT", "1h").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_symbols_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/symbols"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "symbols": ["BTCUSDT", "DOGEUSDT"]
            })))
            .mount(&server)
            .await;

        let client = PredictionClient::new(&server.uri()).unwrap();
        let symbols = client.fetch_valid_symbols().await;
        assert_eq!(symbols, vec!["BTCUSDT".to_string(), "DOGEUSDT".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_symbols_empty_list_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/symbols"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"symbols": []})))
            .mount(&server)
            .await;

        let client = PredictionClient::new(&server.uri()).unwrap();
        assert_eq!(client.fetch_valid_symbols().await, fallback_symbols());
    }

    #[tokio::test]
    async fn test_fetch_symbols_network_error_falls_back() {
        let client = PredictionClient::new(DEAD_URL).unwrap();
        let symbols = client.fetch_valid_symbols().await;

        assert_eq!(symbols.len(), FALLBACK_SYMBOLS.len());
        assert!(symbols.iter().any(|s| s == "ETHBTC"));
    }
}
