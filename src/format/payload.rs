//! Prediction payload as returned by the API
//!
//! Every field is optional so that presence is checked where it is used
//! rather than at decode time. Price-like fields accept numbers or strings
//! such as `"$1,234.50"`.

use crate::error::{BotError, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionPayload {
    pub metadata: Option<Metadata>,
    pub price_analysis: Option<PriceAnalysis>,
    /// Kept raw and read through [`AiInsights::from_value`]
    pub ai_insights: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metadata {
    pub confidence_score: Option<f64>,
    pub last_updated: Option<String>,
    pub data_quality: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceAnalysis {
    pub current: Option<Price>,
    pub prediction: Option<Price>,
    pub rsi: Option<f64>,
    pub volatility: Option<f64>,
    pub sma_20: Option<Price>,
    pub sma_50: Option<Price>,
    pub key_levels: Option<KeyLevels>,
    pub macd: Option<Macd>,
    pub prediction_range: Option<PredictionRange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyLevels {
    pub support: Option<Price>,
    pub resistance: Option<Price>,
    pub trend_strength: Option<Price>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Macd {
    pub macd_line: Option<Vec<Price>>,
    pub signal_line: Option<Vec<Price>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionRange {
    pub low: Option<Price>,
    pub high: Option<Price>,
}

/// Free-form insight fields. Unexpected shapes are tolerated, never rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiInsights {
    pub market_summary: Option<Value>,
    pub recommendation: Option<TradingRecommendation>,
    pub risk_factors: Vec<Value>,
}

impl AiInsights {
    pub fn from_value(raw: &Value) -> Self {
        let field = |name: &str| raw.get(name).filter(|v| is_truthy(v));

        let recommendation = match field("trading_recommendations") {
            Some(Value::Array(items)) => items.first().and_then(TradingRecommendation::from_value),
            Some(other) => TradingRecommendation::from_value(other),
            None => None,
        };

        let risk_factors = match field("risk_factors") {
            Some(Value::Array(items)) => items.clone(),
            Some(single) => vec![single.clone()],
            None => Vec::new(),
        };

        Self {
            market_summary: field("market_summary").cloned(),
            recommendation,
            risk_factors,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradingRecommendation {
    pub action: Option<Value>,
    pub entry: Option<Value>,
    pub exit: Option<Value>,
}

impl TradingRecommendation {
    /// `None` unless `raw` is an object
    fn from_value(raw: &Value) -> Option<Self> {
        let fields = raw.as_object()?;
        Some(Self {
            action: fields.get("action").cloned(),
            entry: fields.get("entry").cloned(),
            exit: fields.get("exit").cloned(),
        })
    }
}

/// Whether a JSON value counts as present: not null, false, zero or empty
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Numeric value that may arrive as a JSON number or a formatted string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Number(f64),
    Text(String),
}

impl Price {
    pub fn value(&self) -> Result<f64> {
        match self {
            Price::Number(n) => Ok(*n),
            Price::Text(s) => parse_price(s),
        }
    }
}

/// Parse a price string, dropping a `$` marker, anything after the amount and
/// thousands separators.
pub fn parse_price(raw: &str) -> Result<f64> {
    let amount = match raw.split_once('$') {
        Some((_, rest)) => rest.split_whitespace().next().unwrap_or(""),
        None => raw,
    };

    let cleaned: String = amount.chars().filter(|c| *c != ',').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .map_err(|_| BotError::Format(format!("invalid price {:?}", raw)))
}

/// Value of an optional price, 0 when absent
pub fn price_or_zero(price: Option<&Price>) -> Result<f64> {
    price.map_or(Ok(0.0), Price::value)
}
