//! Crypto Prediction Bot
//!
//! A Telegram front-end for a remote crypto price prediction API, with
//! per-user daily quotas and a referral bonus scheme.
//!
//! ## Architecture
//!
//! ```text
//! Telegram (getUpdates) → Dispatcher → QuotaStore (read)
//!                              ↓
//!                     PredictionClient → Formatter → reply → QuotaStore (write)
//!
//! Health server (/health) → QuotaStore (ping)
//! ```

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod monitor;
pub mod storage;
pub mod telegram;
