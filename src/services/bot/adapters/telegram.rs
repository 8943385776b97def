//! Telegram Adapter
//!
//! Telegram Bot adapter using teloxide for long-polling message reception.
//! Implements the ChatAdapter trait with a chat id allow list and message
//! splitting for Telegram's 4096 character limit.

use super::ChatAdapter;
use crate::services::bot::types::{ChatError, IncomingMessage, TelegramAdapterConfig};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Telegram Bot adapter using teloxide with long-polling.
pub struct TelegramAdapter {
    pub(crate) config: TelegramAdapterConfig,
    pub(crate) bot: teloxide::Bot,
    pub(crate) cancel_token: CancellationToken,
}

impl TelegramAdapter {
    pub fn new(config: TelegramAdapterConfig) -> Result<Self, ChatError> {
        let bot_token = config
            .bot_token
            .as_ref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ChatError::ConfigError("Bot token is required".to_string()))?;

        let bot = teloxide::Bot::new(bot_token);

        Ok(Self {
            config,
            bot,
            cancel_token: CancellationToken::new(),
        })
    }

    /// Publish the command menu shown by Telegram clients.
    async fn register_commands(&self) {
        use teloxide::prelude::*;

        let commands = relay_bot_core::BotCommand::all()
            .into_iter()
            .map(|c| teloxide::types::BotCommand::new(c.name(), c.description()));

        if let Err(e) = self.bot.set_my_commands(commands).await {
            tracing::warn!(error = %e, "Failed to register bot commands");
        }
    }
}

/// Check `chat_id` against the allow list. An empty list admits everyone.
pub fn authorize(allowed_chat_ids: &[i64], chat_id: i64) -> Result<(), ChatError> {
    if allowed_chat_ids.is_empty() || allowed_chat_ids.contains(&chat_id) {
        Ok(())
    } else {
        Err(ChatError::Unauthorized)
    }
}

/// Split long messages at line boundaries to respect platform limits.
///
/// Lengths are counted in characters; lines longer than the limit are cut
/// at character boundaries.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();
        let separator = usize::from(!current.is_empty());

        if current_len + separator + line_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            // Handle single lines longer than max_chars
            if line_len > max_chars {
                let chars: Vec<char> = line.chars().collect();
                for piece in chars.chunks(max_chars) {
                    chunks.push(piece.iter().collect());
                }
                continue;
            }
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[async_trait]
impl ChatAdapter for TelegramAdapter {
    async fn start(&self, message_tx: mpsc::Sender<IncomingMessage>) -> Result<(), ChatError> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::types::{Message, Update};

        self.register_commands().await;

        let bot = self.bot.clone();
        let allowed_chat_ids = self.config.allowed_chat_ids.clone();
        let cancel = self.cancel_token.clone();

        tokio::spawn(async move {
            let handler =
                Update::filter_message().endpoint(move |msg: Message, _bot: teloxide::Bot| {
                    let tx = message_tx.clone();
                    let allowed_chats = allowed_chat_ids.clone();
                    async move {
                        // Authorization check: chat ID allow list
                        let chat_id = msg.chat.id.0;
                        if let Err(e) = authorize(&allowed_chats, chat_id) {
                            tracing::debug!(chat_id, error = %e, "Dropping message");
                            return Ok::<(), Box<dyn std::error::Error + Send + Sync>>(());
                        }

                        // Extract text and forward to the gateway
                        if let Some(text) = msg.text() {
                            let user = msg.from.as_ref();
                            let incoming = IncomingMessage {
                                chat_id,
                                user_id: user.map(|u| u.id.0 as i64).unwrap_or(0),
                                full_name: user.map(|u| u.full_name()).unwrap_or_default(),
                                username: user.and_then(|u| u.username.clone()),
                                text: text.to_string(),
                                timestamp: chrono::Utc::now(),
                            };
                            if tx.send(incoming).await.is_err() {
                                tracing::warn!(chat_id, "Gateway channel closed, message dropped");
                            }
                        }
                        Ok(())
                    }
                });

            let mut dispatcher = Dispatcher::builder(bot, handler).build();

            // Get shutdown token for graceful termination
            let shutdown_token = dispatcher.shutdown_token();

            // Spawn a task that watches the CancellationToken and triggers shutdown
            let cancel_clone = cancel.clone();
            tokio::spawn(async move {
                cancel_clone.cancelled().await;
                let _ = shutdown_token.shutdown();
            });

            tracing::info!("Telegram long polling started");
            dispatcher.dispatch().await;
            tracing::info!("Telegram long polling stopped");
        });

        Ok(())
    }

    async fn stop(&self) -> Result<(), ChatError> {
        self.cancel_token.cancel();
        Ok(())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChatError> {
        use teloxide::prelude::*;
        use teloxide::types::ChatId;

        let chunks = split_message(text, self.config.max_message_length);
        for chunk in chunks {
            self.bot
                .send_message(ChatId(chat_id), chunk)
                .await
                .map_err(|e| ChatError::SendFailed(e.to_string()))?;
        }
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), ChatError> {
        use teloxide::prelude::*;
        use teloxide::types::{ChatAction, ChatId};

        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .map_err(|e| ChatError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChatError> {
        use teloxide::prelude::*;

        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| ChatError::ConfigError(format!("Bot health check failed: {}", e)))?;
        tracing::info!(username = ?me.username, "Telegram bot token verified");
        Ok(())
    }
}
