//! Relay Bot - Rust Library
//!
//! This library provides the backend of the relay bot. It includes:
//! - The CLI entry points
//! - Bot and remote host services
//! - Storage layer (SQLite, env config)
//! - Error types and utilities

pub mod cli;
pub mod services;
pub mod storage;
pub mod utils;

pub use storage::config::BotConfig;
pub use storage::database::Database;
pub use utils::error::{AppError, AppResult};
