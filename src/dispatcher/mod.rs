//! Update routing
//!
//! Each incoming update is handled start to finish on its own: commands,
//! menu button presses and free-text symbol requests. Nothing here returns
//! an error; every failure ends in a reply to the user and a log line.

pub mod replies;


use crate::client::PredictionSource;
use crate::format::format_prediction;
use crate::storage::QuotaStore;
use crate::telegram::{
    CallbackQuery, ChatAction, ChatApi, Message, SendOptions, Update, User,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Interval requested for every prediction
pub const TIMEFRAME: &str = "1h";

pub const MIN_SYMBOL_LEN: usize = 4;
pub const MAX_SYMBOL_LEN: usize = 12;

const REFERRAL_PREFIX: &str = "ref_";

/// A slash command addressed to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`, with the first argument if any
    Start { arg: Option<String> },
    /// Any other command; ignored
    Other(String),
}

impl Command {
    /// Parse a message as a command, `None` for plain text
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let name = name.split('@').next().unwrap_or(name).to_lowercase();

        match name.as_str() {
            "start" => Some(Command::Start {
                arg: parts.next().map(str::to_string),
            }),
            _ => Some(Command::Other(name)),
        }
    }
}

/// Menu buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    GetPredictions,
    ShowReferral,
    MainMenu,
}

impl MenuAction {
    pub fn from_callback(data: &str) -> Option<Self> {
        match data {
            replies::CB_GET_PREDICTIONS => Some(MenuAction::GetPredictions),
            replies::CB_SHOW_REFERRAL => Some(MenuAction::ShowReferral),
            replies::CB_MAIN_MENU => Some(MenuAction::MainMenu),
            _ => None,
        }
    }
}

/// Referrer id from a `ref_<id>` start argument
pub fn parse_referrer(token: &str) -> Option<i64> {
    token
        .strip_prefix(REFERRAL_PREFIX)?
        .split('_')
        .next()?
        .parse()
        .ok()
}

/// Why a symbol was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRejection {
    BadLength,
    Unsupported,
}

impl SymbolRejection {
    fn reply(self) -> &'static str {
        match self {
            SymbolRejection::BadLength => replies::INVALID_LENGTH,
            SymbolRejection::Unsupported => replies::UNSUPPORTED_PAIR,
        }
    }
}

/// Length check done before any network call
pub fn check_symbol_length(symbol: &str) -> Result<(), SymbolRejection> {
    let len = symbol.chars().count();
    if (MIN_SYMBOL_LEN..=MAX_SYMBOL_LEN).contains(&len) {
        Ok(())
    } else {
        Err(SymbolRejection::BadLength)
    }
}

pub struct Dispatcher {
    chat: Arc<dyn ChatApi>,
    predictions: Arc<dyn PredictionSource>,
    store: Arc<QuotaStore>,
    bot_username: String,
}

impl Dispatcher {
    pub fn new(
        chat: Arc<dyn ChatApi>,
        predictions: Arc<dyn PredictionSource>,
        store: Arc<QuotaStore>,
        bot_username: String,
    ) -> Self {
        Self {
            chat,
            predictions,
            store,
            bot_username,
        }
    }

    /// Handle updates from `updates`, one task each, until the channel closes
    /// or `shutdown` resolves. In-flight updates are finished before returning.
    pub async fn run<F>(self: Arc<Self>, mut updates: mpsc::Receiver<Update>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting updates");
                    break;
                }
                update = updates.recv() => {
                    let Some(update) = update else {
                        info!("Update channel closed");
                        break;
                    };
                    let dispatcher = self.clone();
                    tasks.spawn(async move { dispatcher.handle_update(update).await });
                }
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = result {
                        tracing::error!("Update handler panicked: {}", e);
                    }
                }
            }
        }

        if !tasks.is_empty() {
            info!("Waiting for {} in-flight updates", tasks.len());
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!("Update handler panicked: {}", e);
            }
        }
    }

    pub async fn handle_update(&self, update: Update) {
        if let Some(query) = update.callback_query {
            self.handle_callback(query).await;
        } else if let Some(message) = update.message {
            self.handle_message(message).await;
        }
    }

    async fn handle_message(&self, message: Message) {
        let (Some(text), Some(user)) = (message.text.as_deref(), message.from.as_ref()) else {
            return;
        };
        let chat_id = message.chat.id;

        match Command::parse(text) {
            Some(Command::Start { arg }) => self.handle_start(chat_id, user, arg.as_deref()).await,
            Some(Command::Other(name)) => debug!("Ignoring unsupported command /{}", name),
            None => self.handle_symbol(chat_id, user.id, text).await,
        }
    }

    async fn handle_start(&self, chat_id: i64, user: &User, arg: Option<&str>) {
        info!("User {} started the bot", user.id);

        if let Some(token) = arg.filter(|a| a.starts_with(REFERRAL_PREFIX)) {
            match parse_referrer(token) {
                Some(referrer) if referrer != user.id => self.store.apply_referral(referrer).await,
                Some(_) => debug!("User {} tried to refer themselves", user.id),
                None => warn!("Invalid referral format: {}", token),
            }
        }

        let text = replies::welcome(&user.first_name, self.store.daily_limit());
        let options = SendOptions::default().with_keyboard(replies::main_menu_keyboard());
        self.reply(chat_id, &text, options).await;
    }

    async fn handle_callback(&self, query: CallbackQuery) {
        if let Err(e) = self.chat.answer_callback_query(&query.id).await {
            warn!("Failed to answer callback query: {}", e);
        }

        let Some(action) = query.data.as_deref().and_then(MenuAction::from_callback) else {
            debug!("Ignoring unknown callback data {:?}", query.data);
            return;
        };
        let Some(message) = query.message.as_ref() else {
            return;
        };

        let (text, options) = match action {
            MenuAction::GetPredictions => (replies::INSTRUCTIONS.to_string(), SendOptions::default()),
            MenuAction::ShowReferral => {
                let link = replies::referral_link(&self.bot_username, query.from.id);
                (
                    replies::referral_program(self.store.referral_bonus(), &link),
                    SendOptions::markdown().with_keyboard(replies::referral_keyboard(&link)),
                )
            }
            MenuAction::MainMenu => (
                replies::MAIN_MENU.to_string(),
                SendOptions::markdown().with_keyboard(replies::main_menu_keyboard()),
            ),
        };

        if let Err(e) = self
            .chat
            .edit_message_text(message.chat.id, message.message_id, &text, options)
            .await
        {
            warn!("Failed to update menu message: {}", e);
        }
    }

    async fn handle_symbol(&self, chat_id: i64, user_id: i64, text: &str) {
        let symbol = text.trim().to_uppercase();

        if let Err(e) = self.chat.send_chat_action(chat_id, ChatAction::Typing).await {
            debug!("Failed to send typing action: {}", e);
        }

        if let Err(rejection) = self.validate_symbol(&symbol).await {
            debug!("Rejected symbol {:?}: {:?}", symbol, rejection);
            self.reply(chat_id, rejection.reply(), SendOptions::default()).await;
            return;
        }

        let remaining = self.store.get_remaining(user_id).await;
        if remaining <= 0 {
            info!("User {} has no predictions left today", user_id);
            let options = SendOptions::default().with_keyboard(replies::upsell_keyboard());
            self.reply(chat_id, replies::LIMIT_REACHED, options).await;
            return;
        }

        let notice = self.reply(chat_id, replies::CALCULATING, SendOptions::default()).await;

        let prediction = self.predictions.fetch_prediction(&symbol, TIMEFRAME).await;
        if prediction.is_some() {
            self.store.record_usage(user_id, 1).await;
        }

        if let Some(notice) = notice {
            if let Err(e) = self.chat.delete_message(chat_id, notice.message_id).await {
                warn!("Failed to delete calculating message: {}", e);
            }
        }

        let Some(payload) = prediction else {
            self.reply(chat_id, replies::PREDICTION_UNAVAILABLE, SendOptions::default()).await;
            return;
        };

        let text = format_prediction(&payload, &symbol, TIMEFRAME, remaining);
        let options = SendOptions::markdown().with_keyboard(replies::result_keyboard());
        if let Err(e) = self.chat.send_message(chat_id, &text, options).await {
            tracing::error!("Error sending prediction for {}: {}", symbol, e);
            self.reply(chat_id, replies::DISPLAY_FAILED, SendOptions::default()).await;
        }
    }

    async fn validate_symbol(&self, symbol: &str) -> Result<(), SymbolRejection> {
        check_symbol_length(symbol)?;

        let whitelist = self.predictions.fetch_valid_symbols().await;
        if whitelist.iter().any(|s| s == symbol) {
            Ok(())
        } else {
            Err(SymbolRejection::Unsupported)
        }
    }

    async fn reply(&self, chat_id: i64, text: &str, options: SendOptions) -> Option<Message> {
        match self.chat.send_message(chat_id, text, options).await {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::error!("Failed to send reply to chat {}: {}", chat_id, e);
                None
            }
        }
    }
}
