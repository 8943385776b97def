//! Relay Bot Core
//!
//! Transport- and storage-free building blocks of the relay bot. Nothing in
//! this crate performs I/O.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`)
//! - `extract` - Phone / e-mail extractors and the password strength check
//! - `command` - Catalog of chat commands (`BotCommand`, `HostQuery`)
//! - `session` - Per-conversation session state (`Session`, `WaitingFor`, `ScratchKey`)

pub mod command;
pub mod error;
pub mod extract;
pub mod session;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::CoreError;

// ── Extractors ─────────────────────────────────────────────────────────
pub use extract::{check_password_strength, extract_emails, extract_phones, PASSWORD_SYMBOLS};

// ── Commands ───────────────────────────────────────────────────────────
pub use command::{BotCommand, HostQuery};

// ── Session State ──────────────────────────────────────────────────────
pub use session::{ContactKind, ScratchKey, Session, WaitingFor};
