//! Unit tests for prediction formatting

#[cfg(test)]
mod tests {
    use super::super::*;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{json, Value};

    fn base_payload(last_updated: &str) -> Value {
        json!({
            "metadata": {
                "confidence_score": 0.9,
                "last_updated": last_updated,
                "data_quality": 0.8
            },
            "price_analysis": {
                "current": 100,
                "prediction": 110,
                "rsi": 50,
                "volatility": 0.02,
                "prediction_range": {"low": 95, "high": 115}
            }
        })
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_minimal_payload_renders() {
        let now = Utc::now();
        let payload = base_payload(&now.to_rfc3339());

        let message = format_prediction(&payload, "BTCUSDT", "1h", 5);

        assert!(message.contains("📈"));
        assert!(message.contains("+10.00%"));
        assert!(message.contains("$100.00"));
        assert!(message.contains("$110.00"));
        assert!(message.contains("Predictions Left: 4"));
        assert!(message.contains("Timeframe: 1h"));
        assert!(message.contains("🟢 Confidence: 90%"));
        assert!(message.contains("📊 Data Quality: 80%"));
        assert!(message.contains("🕒 Updated: just now"));
        assert!(message.contains("📊 Range: $95.00 - $115.00"));
        assert!(message.contains("• RSI: 50.0"));
        assert!(message.contains("• Volatility: 2.00%"));
    }

    #[test]
    fn test_optional_sections_omitted() {
        let payload = base_payload("2024-05-01T11:59:30Z");
        let message = format_prediction_at(&payload, "BTCUSDT", "1h", 5, fixed_now());

        assert!(!message.contains("Market Summary"));
        assert!(!message.contains("Recommended Action"));
        assert!(!message.contains("Risk Factors"));
        assert!(message.contains("• MACD: \n"));
        // Absent moving averages and key levels render as zero
        assert!(message.contains("• SMA20: $0.00000000"));
        assert!(message.contains("• Support: $0.00000000"));
        assert!(message.contains("• Trend Strength: 0.0%"));
    }

    #[test]
    fn test_full_payload_renders_every_section() {
        let payload = json!({
            "metadata": {
                "confidence_score": 0.75,
                "last_updated": "2024-05-01T09:30:00+00:00",
                "data_quality": 0.95
            },
            "price_analysis": {
                "current": "$64,250.10",
                "prediction": "$63,000.00",
                "rsi": 61.23,
                "volatility": 0.0345,
                "sma_20": "64,100.55",
                "sma_50": 62000,
                "key_levels": {
                    "support": "$62,500",
                    "resistance": 66000,
                    "trend_strength": 0.42
                },
                "macd": {
                    "macd_line": [1.0, 2.5],
                    "signal_line": [0.5, 1.5]
                },
                "prediction_range": {"low": "$62,000.00", "high": "$65,500.00"}
            },
            "ai_insights": {
                "market_summary": "Momentum is cooling after a strong week.",
                "trading_recommendations": [
                    {"action": "SELL", "entry": "$64,200", "exit": 62800},
                    {"action": "HOLD"}
                ],
                "risk_factors": ["ETF outflows", "Macro data", "Exchange risk"]
            }
        });

        let message = format_prediction_at(&payload, "BTCUSDT", "4h", 3, fixed_now());

        assert!(message.starts_with("*BTCUSDT Price Analysis* 📉\nTimeframe: 4h\n"));
        assert!(message.contains("💰 Current Price: $64,250.10"));
        assert!(message.contains("🎯 Predicted Price: $63,000.00 (-1.95%)"));
        assert!(message.contains("• RSI: 61.2"));
        assert!(message.contains("• Volatility: 3.45%"));
        assert!(message.contains("• MACD: 🟢 Bullish"));
        assert!(message.contains("• SMA20: $64,100.55"));
        assert!(message.contains("• SMA50: $62,000.00"));
        assert!(message.contains("• Support: $62,500.00"));
        assert!(message.contains("• Resistance: $66,000.00"));
        assert!(message.contains("• Trend Strength: 42.0%"));
        assert!(message.contains("📊 *Market Summary*\nMomentum is cooling after a strong week.\n"));
        assert!(message.contains("💡 *Recommended Action:* SELL\nEntry: $64,200\nExit: 62800\n"));
        assert!(message.contains("⚠️ *Risk Factors:*\n• ETF outflows\n• Macro data"));
        assert!(!message.contains("Exchange risk"));
        assert!(message.contains("🟡 Confidence: 75%"));
        assert!(message.contains("🕒 Updated: 2 hours ago"));
        assert!(message.ends_with("📊 Predictions Left: 2"));
    }

    #[test]
    fn test_bearish_macd_and_missing_recommendation_fields() {
        let mut payload = base_payload("2024-05-01T11:45:00Z");
        payload["price_analysis"]["macd"] = json!({
            "macd_line": [0.1],
            "signal_line": [0.3]
        });
        payload["ai_insights"] = json!({
            "trading_recommendations": [{"action": "BUY"}]
        });

        let message = format_prediction_at(&payload, "BTCUSDT", "1h", 5, fixed_now());

        assert!(message.contains("• MACD: 🔴 Bearish"));
        assert!(message.contains("💡 *Recommended Action:* BUY\nEntry: N/A\nExit: N/A\n"));
        assert!(message.contains("🕒 Updated: 15 minutes ago"));
    }

    #[test]
    fn test_numeric_market_summary_renders() {
        let mut payload = base_payload("2024-05-01T11:59:30Z");
        payload["ai_insights"] = json!({"market_summary": 42});

        let message = format_prediction_at(&payload, "BTCUSDT", "1h", 5, fixed_now());

        assert_ne!(message, FORMAT_ERROR_MESSAGE);
        assert!(message.contains("📊 *Market Summary*\n42\n"));
    }

    #[test]
    fn test_single_risk_factor_string_renders() {
        let mut payload = base_payload("2024-05-01T11:59:30Z");
        payload["ai_insights"] = json!({
            "risk_factors": "High volatility",
            "trading_recommendations": "hold"
        });

        let message = format_prediction_at(&payload, "BTCUSDT", "1h", 5, fixed_now());

        assert_ne!(message, FORMAT_ERROR_MESSAGE);
        assert!(message.contains("⚠️ *Risk Factors:*\n• High volatility"));
        assert!(!message.contains("Recommended Action"));
    }

    #[test]
    fn test_non_object_insights_ignored() {
        let mut payload = base_payload("2024-05-01T11:59:30Z");
        payload["ai_insights"] = json!(["unexpected"]);

        let message = format_prediction_at(&payload, "BTCUSDT", "1h", 5, fixed_now());

        assert!(message.starts_with("*BTCUSDT Price Analysis*"));
        assert!(!message.contains("Market Summary"));
    }

    #[test]
    fn test_empty_macd_series_has_no_label() {
        let mut payload = base_payload("2024-05-01T11:59:00Z");
        payload["price_analysis"]["macd"] = json!({"macd_line": [], "signal_line": [1.0]});

        let message = format_prediction_at(&payload, "BTCUSDT", "1h", 5, fixed_now());
        assert!(message.contains("• MACD: \n"));
    }

    #[test]
    fn test_non_stablecoin_quote_label() {
        let mut payload = base_payload("2024-05-01T12:00:00Z");
        payload["price_analysis"]["current"] = json!(0.05);
        payload["price_analysis"]["prediction"] = json!(0.051);

        let message = format_prediction_at(&payload, "ETHBTC", "1h", 5, fixed_now());
        assert!(message.contains("💰 Current Price: BTC 0.0500"));
        assert!(message.contains("🎯 Predicted Price: BTC 0.0510 (+2.00%)"));
    }

    #[test]
    fn test_missing_required_fields_fall_back() {
        let mut payload = base_payload("2024-05-01T12:00:00Z");
        payload["price_analysis"]
            .as_object_mut()
            .unwrap()
            .remove("prediction_range");
        assert_eq!(
            format_prediction_at(&payload, "BTCUSDT", "1h", 5, fixed_now()),
            FORMAT_ERROR_MESSAGE
        );

        let payload = json!({"price_analysis": {"current": 1, "prediction": 2}});
        assert_eq!(format_prediction(&payload, "BTCUSDT", "1h", 5), FORMAT_ERROR_MESSAGE);

        assert_eq!(format_prediction(&json!([1, 2, 3]), "BTCUSDT", "1h", 5), FORMAT_ERROR_MESSAGE);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let mut payload = base_payload("2024-05-01T12:00:00Z");
        payload["price_analysis"]["current"] = json!("price unavailable");
        assert_eq!(
            format_prediction_at(&payload, "BTCUSDT", "1h", 5, fixed_now()),
            FORMAT_ERROR_MESSAGE
        );

        let mut payload = base_payload("yesterday-ish");
        payload["metadata"]["data_quality"] = json!(0.5);
        assert_eq!(
            format_prediction_at(&payload, "BTCUSDT", "1h", 5, fixed_now()),
            FORMAT_ERROR_MESSAGE
        );

        let mut payload = base_payload("2024-05-01T12:00:00Z");
        payload["price_analysis"]["current"] = json!(0);
        assert_eq!(
            format_prediction_at(&payload, "BTCUSDT", "1h", 5, fixed_now()),
            FORMAT_ERROR_MESSAGE
        );
    }

    #[test]
    fn test_naive_timestamp_treated_as_utc() {
        let payload = base_payload("2024-05-01T11:00:00.123456");
        let message = format_prediction_at(&payload, "BTCUSDT", "1h", 5, fixed_now());
        assert!(message.contains("🕒 Updated: 59 minutes ago"));
    }

    #[test]
    fn test_format_price_tiers() {
        assert_eq!(format_price(0.00001234), "0.00001234");
        assert_eq!(format_price(0.005), "0.005000");
        assert_eq!(format_price(0.5), "0.5000");
        assert_eq!(format_price(1.0), "1.00");
        assert_eq!(format_price(999.999), "1,000.00");
        assert_eq!(format_price(1234567.891), "1,234,567.89");
    }

    #[test]
    fn test_quote_currency() {
        assert_eq!(quote_currency("BTCUSDT"), "$");
        assert_eq!(quote_currency("ETHUSDC"), "$");
        assert_eq!(quote_currency("BNBFDUSD"), "$");
        assert_eq!(quote_currency("ETHBTC"), "BTC ");
        assert_eq!(quote_currency("BTCEUR"), "EUR ");
        assert_eq!(quote_currency("ABCD"), "ABCD ");
    }

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(confidence_glyph(0.95), "🟢");
        assert_eq!(confidence_glyph(0.8), "🟡");
        assert_eq!(confidence_glyph(0.61), "🟡");
        assert_eq!(confidence_glyph(0.6), "🔴");
    }

    #[test]
    fn test_describe_age() {
        assert_eq!(describe_age(Duration::seconds(-30)), "just now");
        assert_eq!(describe_age(Duration::seconds(59)), "just now");
        assert_eq!(describe_age(Duration::seconds(60)), "1 minutes ago");
        assert_eq!(describe_age(Duration::minutes(59)), "59 minutes ago");
        assert_eq!(describe_age(Duration::minutes(60)), "1 hours ago");
        assert_eq!(describe_age(Duration::hours(26)), "26 hours ago");
    }
}
