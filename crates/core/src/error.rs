//! Core Error Types
//!
//! Minimal error set for the core crate (only thiserror + std). The
//! application crate defines the storage, shell and transport errors.

use thiserror::Error;

/// Core error type for the relay bot workspace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Unknown command names
    #[error("Parse error: {0}")]
    Parse(String),
}

impl CoreError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
