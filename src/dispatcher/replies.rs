//! User-facing texts and keyboards

use crate::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};

pub const CB_GET_PREDICTIONS: &str = "get_predictions";
pub const CB_SHOW_REFERRAL: &str = "show_referral";
pub const CB_MAIN_MENU: &str = "main_menu";

pub const INSTRUCTIONS: &str = "🔍 Send me a trading pair like BTCUSDT to get started!\n\n\
    Popular pairs:\n\
    • BTCUSDT (Bitcoin)\n\
    • ETHUSDT (Ethereum)\n\
    • SOLUSDT (Solana)";

pub const MAIN_MENU: &str = "🤖 *Main Menu*\n\nChoose an option:";

pub const INVALID_LENGTH: &str = "❌ Invalid trading pair length.\n\n\
    Please use valid pairs like:\n\
    • Stablecoin pairs: BTCUSDT, ETHUSDC, BNBFDUSD\n\
    • Crypto pairs: ETHBTC, BNBBTC, LRCETH\n\
    • Fiat pairs: BTCEUR, ETHGBP, BNBTRY";

pub const UNSUPPORTED_PAIR: &str = "❌ Unsupported trading pair.\n\n\
    Popular pairs you can try:\n\
    • Stablecoin: BTCUSDT, ETHUSDC, BNBFDUSD\n\
    • Crypto: ETHBTC, BNBBTC, LRCETH\n\
    • Fiat: BTCEUR, ETHEUR, BNBTRY";

pub const LIMIT_REACHED: &str = "🚫 Daily limit reached!\n\n\
    💡 Get more predictions by inviting friends.";

pub const CALCULATING: &str = "🔄 Calculating prediction...\nThis may take a few moments.";

pub const PREDICTION_UNAVAILABLE: &str = "⚠️ Unable to generate prediction.\n\n\
    This could be due to:\n\
    1. Temporary API issues\n\
    2. High server load\n\
    3. Market data unavailability\n\n\
    Please try again in a few moments.";

pub const DISPLAY_FAILED: &str = "⚠️ Error displaying prediction.\nPlease try again.";

pub fn welcome(first_name: &str, daily_limit: i64) -> String {
    format!(
        "👋 Welcome {}!\n\n\
         📊 I provide crypto price predictions using advanced AI models.\n\
         📌 You have {} free predictions today.\n\n\
         🎁 Invite friends to get more predictions!",
        first_name, daily_limit
    )
}

pub fn referral_link(bot_username: &str, user_id: i64) -> String {
    format!("https://t.me/{}?start=ref_{}", bot_username, user_id)
}

pub fn referral_program(referral_bonus: i64, link: &str) -> String {
    format!(
        "🎁 *Referral Program*\n\n\
         • Get +{} predictions for each friend who joins\n\
         • Your friend also gets bonus predictions\n\n\
         Share your referral link:\n\
         `{}`",
        referral_bonus, link
    )
}

pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::column(vec![
        InlineKeyboardButton::callback("🔮 Get Predictions", CB_GET_PREDICTIONS),
        InlineKeyboardButton::callback("👥 Refer Friends", CB_SHOW_REFERRAL),
    ])
}

pub fn referral_keyboard(link: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::column(vec![
        InlineKeyboardButton::url("📲 Share Link", link),
        InlineKeyboardButton::callback("🔙 Back", CB_MAIN_MENU),
    ])
}

pub fn upsell_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::column(vec![InlineKeyboardButton::callback(
        "👥 Get More Predictions",
        CB_SHOW_REFERRAL,
    )])
}

pub fn result_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::column(vec![InlineKeyboardButton::callback(
        "👥 Refer Friends",
        CB_SHOW_REFERRAL,
    )])
}
