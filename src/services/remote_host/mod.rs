//! Remote Host
//!
//! Runs fixed shell command strings on the monitored host and returns their
//! standard output. The production implementation drives the system OpenSSH
//! client over one multiplexed master connection; tests substitute a fake
//! through the [`RemoteShell`] trait.

pub mod catalog;
pub mod ssh;

use async_trait::async_trait;

pub use catalog::{shell_quote, HostCommands, APT_LIST_ALL};
pub use ssh::SshSession;

/// Failure of one remote command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShellError {
    #[error("Failed to start ssh: {0}")]
    Spawn(String),

    #[error("SSH connection failed: {0}")]
    Connection(String),

    #[error("Command exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Command output is not valid UTF-8")]
    Decode,

    #[error("Command timed out after {0} s")]
    Timeout(u64),
}

/// Executes a literal command string on the remote host.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run `command` and return its standard output with surrounding
    /// whitespace trimmed. A non-zero exit status is an error.
    async fn run(&self, command: &str) -> Result<String, ShellError>;
}
