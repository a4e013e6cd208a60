//! Telegram Bot API client
//!
//! Long-polls `getUpdates` and forwards every update over a channel, and
//! implements [`ChatApi`] for sending replies.

pub mod types;

pub use types::{
    CallbackQuery, Chat, ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, Message,
    ParseMode, SendOptions, Update, User,
};

use crate::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use types::{
    AnswerCallbackQueryRequest, ApiResponse, DeleteMessageRequest, EditMessageTextRequest,
    GetUpdatesRequest, SendChatActionRequest, SendMessageRequest,
};

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Server-side long-poll timeout for `getUpdates`
const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);
const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

/// Outgoing chat operations the dispatcher needs
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str, options: SendOptions) -> Result<Message>;

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        options: SendOptions,
    ) -> Result<()>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()>;

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<()>;
}

/// Telegram bot connection
pub struct TelegramBot {
    http: Client,
    api_url: String,
    bot_token: String,
    last_update_id: RwLock<i64>,
}

impl TelegramBot {
    pub fn new(bot_token: String) -> Result<Self> {
        Self::with_api_url(bot_token, TELEGRAM_API_URL)
    }

    /// Use a different Bot API server (local bot API server or tests)
    pub fn with_api_url(bot_token: String, api_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token,
            last_update_id: RwLock::new(0),
        })
    }

    async fn call<T, B>(&self, method: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}/bot{}/{}", self.api_url, self.bot_token, method);

        let response: ApiResponse<T> = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(BotError::Telegram(
                response
                    .description
                    .unwrap_or_else(|| format!("{} failed", method)),
            ));
        }

        response
            .result
            .ok_or_else(|| BotError::Telegram(format!("{} returned no result", method)))
    }

    /// The bot's own account
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Start polling for updates, forwarding each one to `update_tx`.
    ///
    /// Returns when the receiving side of the channel is dropped.
    pub async fn start_polling(self: Arc<Self>, update_tx: mpsc::Sender<Update>) {
        tracing::info!("Starting Telegram update listener...");

        loop {
            match self.poll_updates().await {
                Ok(updates) => {
                    for update in updates {
                        {
                            let mut last_id = self.last_update_id.write().await;
                            *last_id = update.update_id + 1;
                        }

                        if update_tx.send(update).await.is_err() {
                            tracing::info!("Update channel closed, stopping Telegram listener");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to poll Telegram updates: {}", e);
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }

    pub async fn poll_updates(&self) -> Result<Vec<Update>> {
        let offset = *self.last_update_id.read().await;

        let request = GetUpdatesRequest {
            offset,
            timeout: POLL_TIMEOUT_SECS,
            allowed_updates: ALLOWED_UPDATES,
        };

        self.call("getUpdates", &request).await
    }
}

#[async_trait]
impl ChatApi for TelegramBot {
    async fn send_message(&self, chat_id: i64, text: &str, options: SendOptions) -> Result<Message> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: options.parse_mode,
            reply_markup: options.reply_markup.as_ref(),
        };
        self.call("sendMessage", &request).await
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        options: SendOptions,
    ) -> Result<()> {
        let request = EditMessageTextRequest {
            chat_id,
            message_id,
            text,
            parse_mode: options.parse_mode,
            reply_markup: options.reply_markup.as_ref(),
        };
        // Result is either the edited message or `true`
        let _: serde_json::Value = self.call("editMessageText", &request).await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let request = DeleteMessageRequest { chat_id, message_id };
        let _: bool = self.call("deleteMessage", &request).await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let request = AnswerCallbackQueryRequest { callback_query_id };
        let _: bool = self.call("answerCallbackQuery", &request).await?;
        Ok(())
    }

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<()> {
        let request = SendChatActionRequest { chat_id, action };
        let _: bool = self.call("sendChatAction", &request).await?;
        Ok(())
    }
}
