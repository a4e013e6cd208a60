//! Prediction message formatting
//!
//! Turns a raw prediction payload into the Markdown message shown to users.
//! Rendering is all-or-nothing: if any required field is missing or
//! malformed the caller gets [`FORMAT_ERROR_MESSAGE`] instead of a partial
//! message.

pub mod payload;

#[cfg(test)]
mod tests;

pub use payload::{parse_price, Price, PredictionPayload};

use crate::error::{BotError, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use payload::{price_or_zero, AiInsights, Macd};
use serde::Deserialize;
use serde_json::Value;

pub const FORMAT_ERROR_MESSAGE: &str = "⚠️ Error formatting prediction data";

const STABLECOINS: &[&str] = &["USDT", "USDC", "FDUSD"];
const DIVIDER: &str = "─────────────────";

/// Render a prediction for display. Never fails.
pub fn format_prediction(payload: &Value, symbol: &str, timeframe: &str, remaining: i64) -> String {
    format_prediction_at(payload, symbol, timeframe, remaining, Utc::now())
}

/// Same as [`format_prediction`] with an explicit clock
pub fn format_prediction_at(
    payload: &Value,
    symbol: &str,
    timeframe: &str,
    remaining: i64,
    now: DateTime<Utc>,
) -> String {
    match render(payload, symbol, timeframe, remaining, now) {
        Ok(message) => message,
        Err(e) => {
            tracing::error!("Error formatting prediction message for {}: {}", symbol, e);
            FORMAT_ERROR_MESSAGE.to_string()
        }
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| BotError::Format(format!("missing field `{}`", field)))
}

fn render(
    raw: &Value,
    symbol: &str,
    timeframe: &str,
    remaining: i64,
    now: DateTime<Utc>,
) -> Result<String> {
    let payload = PredictionPayload::deserialize(raw)?;
    let metadata = required(payload.metadata, "metadata")?;
    let analysis = required(payload.price_analysis, "price_analysis")?;
    let insights = payload
        .ai_insights
        .as_ref()
        .map(AiInsights::from_value)
        .unwrap_or_default();

    let quote = quote_currency(symbol);

    let confidence = required(metadata.confidence_score, "metadata.confidence_score")?;
    let last_updated = parse_timestamp(&required(metadata.last_updated, "metadata.last_updated")?)?;
    let data_quality = required(metadata.data_quality, "metadata.data_quality")?;
    let update_text = describe_age(now - last_updated);

    let current = required(analysis.current.as_ref(), "price_analysis.current")?.value()?;
    let predicted = required(analysis.prediction.as_ref(), "price_analysis.prediction")?.value()?;
    if current == 0.0 {
        return Err(BotError::Format("current price is zero".to_string()));
    }
    let change = predicted - current;
    let change_percent = change / current * 100.0;
    let direction = if change > 0.0 { "📈" } else { "📉" };

    let range = required(analysis.prediction_range.as_ref(), "price_analysis.prediction_range")?;
    let range_low = required(range.low.as_ref(), "prediction_range.low")?.value()?;
    let range_high = required(range.high.as_ref(), "prediction_range.high")?.value()?;
    let rsi = required(analysis.rsi, "price_analysis.rsi")?;
    let volatility = required(analysis.volatility, "price_analysis.volatility")?;

    let sma_20 = price_or_zero(analysis.sma_20.as_ref())?;
    let sma_50 = price_or_zero(analysis.sma_50.as_ref())?;

    let key_levels = analysis.key_levels.unwrap_or_default();
    let support = price_or_zero(key_levels.support.as_ref())?;
    let resistance = price_or_zero(key_levels.resistance.as_ref())?;
    let trend_strength = price_or_zero(key_levels.trend_strength.as_ref())?;

    let macd = macd_trend(analysis.macd.as_ref())?;

    let mut message = format!(
        "*{symbol} Price Analysis* {direction}\n\
         Timeframe: {timeframe}\n\
         {DIVIDER}\n\n\
         💰 Current Price: {quote}{current}\n\
         🎯 Predicted Price: {quote}{predicted} ({change_percent:+.2}%)\n\
         📊 Range: {quote}{low} - {quote}{high}\n\n\
         📈 *Technical Analysis*\n\
         • RSI: {rsi:.1}\n\
         • Volatility: {volatility:.2}%\n\
         • MACD: {macd}\n\
         • SMA20: {quote}{sma_20}\n\
         • SMA50: {quote}{sma_50}\n\n\
         📍 *Key Levels*\n\
         • Support: {quote}{support}\n\
         • Resistance: {quote}{resistance}\n\
         • Trend Strength: {trend:.1}%\n",
        current = format_price(current),
        predicted = format_price(predicted),
        low = format_price(range_low),
        high = format_price(range_high),
        volatility = volatility * 100.0,
        sma_20 = format_price(sma_20),
        sma_50 = format_price(sma_50),
        support = format_price(support),
        resistance = format_price(resistance),
        trend = trend_strength * 100.0,
    );

    message.push_str(&insights_section(&insights));

    message.push_str(&format!(
        "\n{DIVIDER}\n\
         {glyph} Confidence: {confidence_pct}%\n\
         📊 Data Quality: {quality_pct}%\n\
         🕒 Updated: {update_text}\n\
         📊 Predictions Left: {left}",
        glyph = confidence_glyph(confidence),
        confidence_pct = (confidence * 100.0) as i64,
        quality_pct = (data_quality * 100.0) as i64,
        left = remaining - 1,
    ));

    Ok(message)
}

fn insights_section(insights: &AiInsights) -> String {
    let mut section = String::new();

    if let Some(summary) = insights.market_summary.as_ref() {
        section.push_str(&format!("\n📊 *Market Summary*\n{}\n", display_value(Some(summary))));
    }

    if let Some(rec) = insights.recommendation.as_ref() {
        section.push_str(&format!(
            "\n💡 *Recommended Action:* {}\nEntry: {}\nExit: {}\n",
            display_value(rec.action.as_ref()),
            display_value(rec.entry.as_ref()),
            display_value(rec.exit.as_ref()),
        ));
    }

    if !insights.risk_factors.is_empty() {
        let lines: Vec<String> = insights
            .risk_factors
            .iter()
            .take(2)
            .map(|risk| format!("• {}", display_value(Some(risk))))
            .collect();
        section.push_str(&format!("\n⚠️ *Risk Factors:*\n{}", lines.join("\n")));
    }

    section
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Label for MACD line vs signal line, empty when either series is missing
fn macd_trend(macd: Option<&Macd>) -> Result<&'static str> {
    let Some(macd) = macd else {
        return Ok("");
    };

    let last_macd = macd.macd_line.as_deref().and_then(<[Price]>::last);
    let last_signal = macd.signal_line.as_deref().and_then(<[Price]>::last);

    match (last_macd, last_signal) {
        (Some(m), Some(s)) => {
            if m.value()? > s.value()? {
                Ok("🟢 Bullish")
            } else {
                Ok("🔴 Bearish")
            }
        }
        _ => Ok(""),
    }
}

/// Currency prefix for prices of `symbol`
pub fn quote_currency(symbol: &str) -> String {
    if STABLECOINS.iter().any(|stable| symbol.ends_with(stable)) {
        return "$".to_string();
    }

    let chars: Vec<char> = symbol.chars().collect();
    let take = if chars.len() >= 6 { 3 } else { 4 };
    let quote: String = chars[chars.len().saturating_sub(take)..].iter().collect();
    format!("{} ", quote)
}

/// Format a price with precision tiered by magnitude
pub fn format_price(price: f64) -> String {
    if price < 0.0001 {
        format!("{:.8}", price)
    } else if price < 0.01 {
        format!("{:.6}", price)
    } else if price < 1.0 {
        format!("{:.4}", price)
    } else {
        group_thousands(&format!("{:.2}", price))
    }
}

fn group_thousands(formatted: &str) -> String {
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted, ""));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

pub fn confidence_glyph(confidence: f64) -> &'static str {
    if confidence > 0.8 {
        "🟢"
    } else if confidence > 0.6 {
        "🟡"
    } else {
        "🔴"
    }
}

/// Human-readable age of the prediction data
pub fn describe_age(elapsed: Duration) -> String {
    let seconds = elapsed.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        format!("{} minutes ago", minutes)
    } else {
        format!("{} hours ago", minutes / 60)
    }
}

/// Parse an RFC 3339 timestamp; naive timestamps are taken as UTC
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|_| BotError::Format(format!("invalid timestamp {:?}", raw)))
}
