//! OpenSSH Session
//!
//! [`RemoteShell`] backed by the system `ssh` client. A control master
//! (`ControlMaster=auto`) is opened by [`SshSession::connect`] and every
//! later command is a short-lived client multiplexed over it, so concurrent
//! callers never share process state. Password auth goes through
//! `sshpass -e`, which reads the secret from `SSHPASS`.

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use super::{RemoteShell, ShellError};
use crate::storage::config::RemoteHostConfig;

/// Exit status `ssh` reserves for its own failures.
const SSH_CONNECTION_FAILURE: i32 = 255;

/// How long the master stays up after the last client disconnects.
const CONTROL_PERSIST_SECS: u64 = 600;

const CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct SshSession {
    config: RemoteHostConfig,
    control_path: PathBuf,
}

impl SshSession {
    pub fn new(config: RemoteHostConfig) -> Self {
        // %C is expanded by ssh to a hash of host, port and user.
        let control_path =
            std::env::temp_dir().join(format!("relay-bot-{}-%C", std::process::id()));
        Self {
            config,
            control_path,
        }
    }

    /// Open the control master by running a no-op command.
    pub async fn connect(&self) -> Result<(), ShellError> {
        self.run("true").await?;
        tracing::info!(
            destination = %self.config.destination(),
            port = self.config.port,
            "SSH control master established"
        );
        Ok(())
    }

    /// Ask the control master to exit. Errors are logged and ignored.
    pub async fn close(&self) {
        let mut cmd = Command::new("ssh");
        cmd.args(self.common_args())
            .args(["-O", "exit"])
            .arg(self.config.destination())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        match cmd.status().await {
            Ok(status) if status.success() => {
                tracing::debug!("SSH control master closed");
            }
            Ok(status) => {
                tracing::debug!(code = ?status.code(), "No SSH control master to close");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to close SSH control master");
            }
        }
    }

    /// Options shared by every ssh invocation.
    fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            self.config.port.to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", CONNECT_TIMEOUT_SECS),
            "-o".to_string(),
            "ControlMaster=auto".to_string(),
            "-o".to_string(),
            format!("ControlPath={}", self.control_path.display()),
            "-o".to_string(),
            format!("ControlPersist={}", CONTROL_PERSIST_SECS),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
        ];
        if self.config.password.is_none() {
            args.push("-o".to_string());
            args.push("BatchMode=yes".to_string());
        }
        args
    }

    /// Program and full argument list for running `remote_command`.
    fn invocation(&self, remote_command: &str) -> (String, Vec<String>) {
        let mut args = Vec::new();
        let program = if self.config.password.is_some() {
            args.push("-e".to_string());
            args.push("ssh".to_string());
            "sshpass".to_string()
        } else {
            "ssh".to_string()
        };
        args.extend(self.common_args());
        args.push(self.config.destination());
        args.push(remote_command.to_string());
        (program, args)
    }
}

#[async_trait]
impl RemoteShell for SshSession {
    async fn run(&self, command: &str) -> Result<String, ShellError> {
        let (program, args) = self.invocation(command);

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(password) = &self.config.password {
            cmd.env("SSHPASS", password);
        }

        tracing::debug!(command = %command, "Running remote command");

        let output = output_within(cmd, self.config.command_timeout()).await?;
        map_output(output).inspect_err(|e| {
            tracing::debug!(command = %command, error = %e, "Remote command failed");
        })
    }
}

/// Run `cmd` to completion, killing it once `limit` elapses.
async fn output_within(mut cmd: Command, limit: Duration) -> Result<Output, ShellError> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    match timeout(limit, cmd.kill_on_drop(true).output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ShellError::Spawn(format!("{}: {}", program, e))),
        Err(_) => {
            tracing::warn!(program = %program, "Remote command timed out");
            Err(ShellError::Timeout(limit.as_secs()))
        }
    }
}

/// Turn a finished ssh client process into the remote command's result.
///
/// Exit status 255 belongs to ssh itself and means the connection failed;
/// any other non-zero status is the remote command's own.
fn map_output(output: Output) -> Result<String, ShellError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(if code == SSH_CONNECTION_FAILURE {
            ShellError::Connection(stderr)
        } else {
            ShellError::NonZeroExit { code, stderr }
        });
    }

    let stdout = String::from_utf8(output.stdout).map_err(|_| ShellError::Decode)?;
    Ok(stdout.trim().to_string())
}
