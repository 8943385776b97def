//! Conversation Session
//!
//! The per-conversation state consumed by the dispatcher: a single
//! `waiting_for` slot naming what the next free-text message means, plus a
//! small scratch mapping used to carry extracted contacts into the
//! confirmation step.

use std::collections::HashMap;
use std::fmt;

// ============================================================================
// WaitingFor
// ============================================================================

/// What the next free-text message of a conversation is interpreted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WaitingFor {
    #[default]
    None,
    PhoneNumber,
    ConfirmationPhone,
    Email,
    ConfirmationEmail,
    Password,
    AptList,
}

impl WaitingFor {
    pub fn as_str(self) -> &'static str {
        match self {
            WaitingFor::None => "none",
            WaitingFor::PhoneNumber => "phone_number",
            WaitingFor::ConfirmationPhone => "confirmation_phone",
            WaitingFor::Email => "email",
            WaitingFor::ConfirmationEmail => "confirmation_email",
            WaitingFor::Password => "password",
            WaitingFor::AptList => "apt_list",
        }
    }

    /// True for the two yes/no states.
    pub fn is_confirmation(self) -> bool {
        matches!(
            self,
            WaitingFor::ConfirmationPhone | WaitingFor::ConfirmationEmail
        )
    }
}

impl fmt::Display for WaitingFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ContactKind / ScratchKey
// ============================================================================

/// Scratch slots. Only extracted contacts are ever stashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScratchKey {
    Phones,
    Emails,
}

/// The two kinds of contact the bot extracts and stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    Phone,
    Email,
}

impl ContactKind {
    /// Table holding this kind of contact.
    pub fn table(self) -> &'static str {
        match self {
            ContactKind::Phone => "phone",
            ContactKind::Email => "email",
        }
    }

    /// Value column of [`ContactKind::table`].
    pub fn column(self) -> &'static str {
        // Each table has a single value column named after the table.
        self.table()
    }

    pub fn scratch_key(self) -> ScratchKey {
        match self {
            ContactKind::Phone => ScratchKey::Phones,
            ContactKind::Email => ScratchKey::Emails,
        }
    }

    /// State that collects the text to extract from.
    pub fn search_state(self) -> WaitingFor {
        match self {
            ContactKind::Phone => WaitingFor::PhoneNumber,
            ContactKind::Email => WaitingFor::Email,
        }
    }

    /// State that waits for the yes/no answer after a successful search.
    pub fn confirmation_state(self) -> WaitingFor {
        match self {
            ContactKind::Phone => WaitingFor::ConfirmationPhone,
            ContactKind::Email => WaitingFor::ConfirmationEmail,
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// State of one conversation. Lives only in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub waiting_for: WaitingFor,
    scratch: HashMap<ScratchKey, Vec<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_waiting(&mut self, state: WaitingFor) {
        self.waiting_for = state;
    }

    pub fn clear_waiting(&mut self) {
        self.waiting_for = WaitingFor::None;
    }

    /// Replace the values stored under `key`.
    pub fn stash(&mut self, key: ScratchKey, values: Vec<String>) {
        self.scratch.insert(key, values);
    }

    /// Values stored under `key`, empty when nothing was stashed.
    pub fn fetch(&self, key: ScratchKey) -> Vec<String> {
        self.scratch.get(&key).cloned().unwrap_or_default()
    }

    pub fn clear_stash(&mut self, key: ScratchKey) {
        self.scratch.remove(&key);
    }
}
