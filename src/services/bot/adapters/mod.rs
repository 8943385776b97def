//! Chat Adapters
//!
//! Trait definition for chat platform adapters. Each adapter implements
//! platform-specific message receiving and sending.

pub mod telegram;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{ChatError, IncomingMessage};

/// Chat adapter trait for platform-specific message handling.
///
/// Adapters are responsible for:
/// - Receiving messages from the platform (long-polling or webhook)
/// - Sending text replies back, split to the platform's length limit
/// - Sending typing indicators
/// - Health checking connectivity
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Start the adapter (begin receiving messages).
    ///
    /// Messages are forwarded through the provided mpsc sender channel.
    /// The adapter should spawn its own task for the message loop.
    async fn start(&self, message_tx: mpsc::Sender<IncomingMessage>) -> Result<(), ChatError>;

    /// Stop the adapter gracefully.
    async fn stop(&self) -> Result<(), ChatError>;

    /// Send a text reply to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChatError>;

    /// Send a typing indicator to show the bot is processing.
    async fn send_typing(&self, chat_id: i64) -> Result<(), ChatError>;

    /// Check adapter health/connectivity.
    ///
    /// For Telegram, this calls the getMe API to verify the bot token.
    async fn health_check(&self) -> Result<(), ChatError>;
}
