//! Bot Types
//!
//! Transport configuration, inbound events, structured replies, gateway
//! status and error types shared by the bot services.

use relay_bot_core::{BotCommand, ContactKind, HostQuery};

use crate::storage::database::ContactRecord;

// ---------------------------------------------------------------------------
// Configuration Types
// ---------------------------------------------------------------------------

/// Telegram's hard limit is 4096; stay below it.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 4000;

/// Telegram-specific configuration
#[derive(Debug, Clone)]
pub struct TelegramAdapterConfig {
    pub bot_token: Option<String>,
    pub allowed_chat_ids: Vec<i64>,
    pub max_message_length: usize,
}

impl Default for TelegramAdapterConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            allowed_chat_ids: Vec::new(),
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }
}

/// Options that change how the dispatcher treats confirmation answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Keep waiting for "да"/"нет" after an unrecognised answer instead of
    /// dropping back to idle.
    pub retry_invalid_confirmation: bool,
    /// Forget stashed contacts once the confirmation step is left.
    pub clear_stash_after_confirmation: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            retry_invalid_confirmation: false,
            clear_stash_after_confirmation: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Message Types
// ---------------------------------------------------------------------------

/// Incoming text message from the chat platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub username: Option<String>,
    pub text: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Event handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Command {
        command: BotCommand,
        conversation_id: i64,
        full_name: String,
    },
    Text {
        conversation_id: i64,
        body: String,
    },
}

impl Inbound {
    pub fn conversation_id(&self) -> i64 {
        match self {
            Inbound::Command {
                conversation_id, ..
            }
            | Inbound::Text {
                conversation_id, ..
            } => *conversation_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Reply Types
// ---------------------------------------------------------------------------

/// What a prompting command asks the user to type next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    PhoneText,
    EmailText,
    Password,
    PackageName,
}

/// Operation whose failure is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Host(HostQuery),
    ListContacts(ContactKind),
    SaveContacts(ContactKind),
    PackageLookup,
}

/// Structured reply produced by the dispatcher and rendered to text by the
/// response mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Greeting { full_name: String },
    Help,
    Prompt(Prompt),
    /// Free text arrived while nothing was pending.
    AwaitingCommand,
    Found {
        kind: ContactKind,
        values: Vec<String>,
    },
    ConfirmSave(ContactKind),
    NotFound(ContactKind),
    Saved(ContactKind),
    NothingToSave(ContactKind),
    SaveCancelled(ContactKind),
    /// The confirmation answer was neither "да" nor "нет".
    AnswerYesNo,
    Records {
        kind: ContactKind,
        records: Vec<ContactRecord>,
    },
    PasswordStrength { strong: bool },
    /// Output of every command behind a host query, in run order.
    HostReport {
        query: HostQuery,
        outputs: Vec<String>,
    },
    PackageInfo(String),
    Failed {
        operation: Operation,
        detail: String,
    },
}

// ---------------------------------------------------------------------------
// Status Types
// ---------------------------------------------------------------------------

/// Gateway runtime status
#[derive(Debug, Clone, Default)]
pub struct GatewayStatus {
    pub running: bool,
    pub connected_since: Option<String>,
    /// Conversations that have sent at least one message
    pub active_conversations: u32,
    /// Conversation workers currently alive
    pub active_workers: u32,
    pub total_messages_processed: u64,
    pub last_message_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Error Types
// ---------------------------------------------------------------------------

/// Chat transport error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChatError {
    #[error("Chat gateway has been stopped")]
    NotEnabled,

    #[error("Failed to send message: {0}")]
    SendFailed(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
