//! Environment Configuration
//!
//! Loads the bot configuration once at startup from the process environment,
//! falling back to an env file (`.env` by default). Process variables win
//! over file entries. A missing env file is not an error.
//!
//! Reading the variables is split from building [`BotConfig`] so the log
//! destination (`LOG_FILE`) is known before logging starts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::utils::error::{AppError, AppResult};

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_DB_PATH: &str = "bot.db";
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_REPLY_CHARS: usize = 4000;
pub const DEFAULT_REPL_LOG_CONTAINER: &str = "bot-postgres_primary-1";
pub const DEFAULT_WORKER_IDLE_SECS: u64 = 600;

/// Variables from the process environment layered over an env file.
#[derive(Debug, Clone)]
pub struct EnvSource {
    path: PathBuf,
    /// `None` when the env file does not exist.
    file_vars: Option<HashMap<String, String>>,
}

impl EnvSource {
    /// Read the given env file (or `.env`). Does not log, so it can run
    /// before the subscriber is installed.
    pub fn read(env_file: Option<&Path>) -> AppResult<Self> {
        let path = env_file.unwrap_or_else(|| Path::new(DEFAULT_ENV_FILE));
        let file_vars = if path.exists() {
            Some(read_env_file(path)?)
        } else {
            None
        };
        Ok(Self {
            path: path.to_path_buf(),
            file_vars,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_found(&self) -> bool {
        self.file_vars.is_some()
    }

    /// Process environment first, then the env file.
    pub fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().or_else(|| self.file_var(key))
    }

    fn file_var(&self, key: &str) -> Option<String> {
        self.file_vars.as_ref().and_then(|vars| vars.get(key).cloned())
    }

    /// Report where the configuration came from.
    pub fn log_origin(&self) {
        match &self.file_vars {
            Some(vars) => tracing::debug!(
                path = %self.path.display(),
                entries = vars.len(),
                "Loaded env file"
            ),
            None => tracing::debug!(
                path = %self.path.display(),
                "Env file not found, using process environment only"
            ),
        }
    }
}

/// Connection settings for the monitored host.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteHostConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Password for `sshpass`. Key-based auth is used when absent.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub command_timeout_secs: u64,
    /// Docker container whose logs `/get_repl_logs` greps.
    pub repl_log_container: String,
}

impl RemoteHostConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// `user@host`
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

impl Default for RemoteHostConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_SSH_PORT,
            user: String::new(),
            password: None,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            repl_log_container: DEFAULT_REPL_LOG_CONTAINER.to_string(),
        }
    }
}

/// Complete bot configuration.
#[derive(Debug, Clone, Serialize)]
pub struct BotConfig {
    #[serde(skip_serializing)]
    pub bot_token: String,
    /// Chats allowed to talk to the bot. Empty means everyone.
    pub allowed_chat_ids: Vec<i64>,
    pub remote: RemoteHostConfig,
    pub db_path: PathBuf,
    pub max_reply_chars: usize,
    /// Keep waiting for "да"/"нет" after an unrecognised answer.
    pub confirm_retry: bool,
    pub log_file: Option<PathBuf>,
    /// Seconds a conversation worker may sit idle before it is dropped.
    pub worker_idle_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            allowed_chat_ids: Vec::new(),
            remote: RemoteHostConfig::default(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            max_reply_chars: DEFAULT_MAX_REPLY_CHARS,
            confirm_retry: false,
            log_file: None,
            worker_idle_secs: DEFAULT_WORKER_IDLE_SECS,
        }
    }
}

impl BotConfig {
    /// Build a config from an [`EnvSource`].
    pub fn from_source(source: &EnvSource) -> AppResult<Self> {
        Self::from_lookup(|key| source.get(key))
    }

    /// Build a config from an arbitrary variable lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| AppError::config(format!("{} is not set", key)))
        };

        let remote = RemoteHostConfig {
            host: require("RM_HOST")?,
            port: parse_var(&get, "RM_PORT", DEFAULT_SSH_PORT)?,
            user: require("RM_USER")?,
            password: get("RM_PASSWORD"),
            command_timeout_secs: parse_var(
                &get,
                "COMMAND_TIMEOUT_SECS",
                DEFAULT_COMMAND_TIMEOUT_SECS,
            )?,
            repl_log_container: get("REPL_LOG_CONTAINER")
                .unwrap_or_else(|| DEFAULT_REPL_LOG_CONTAINER.to_string()),
        };

        let allowed_chat_ids = match get("ALLOWED_CHAT_IDS") {
            Some(raw) => parse_chat_ids(&raw)?,
            None => Vec::new(),
        };

        let confirm_retry = match get("CONFIRM_RETRY") {
            Some(raw) => parse_bool("CONFIRM_RETRY", &raw)?,
            None => false,
        };

        let config = Self {
            bot_token: require("TOKEN")?,
            allowed_chat_ids,
            remote,
            db_path: get("DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            max_reply_chars: parse_var(&get, "MAX_REPLY_CHARS", DEFAULT_MAX_REPLY_CHARS)?,
            confirm_retry,
            log_file: get("LOG_FILE").map(PathBuf::from),
            worker_idle_secs: parse_var(&get, "WORKER_IDLE_SECS", DEFAULT_WORKER_IDLE_SECS)?,
        };

        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.bot_token.trim().is_empty() {
            return Err("Bot token must not be empty".to_string());
        }
        if self.remote.host.trim().is_empty() {
            return Err("Remote host must not be empty".to_string());
        }
        if self.remote.user.trim().is_empty() {
            return Err("Remote user must not be empty".to_string());
        }
        if self.remote.port == 0 {
            return Err("Remote port must be greater than 0".to_string());
        }
        if self.remote.command_timeout_secs == 0 {
            return Err("Command timeout must be greater than 0".to_string());
        }
        if self.max_reply_chars == 0 {
            return Err("Reply limit must be greater than 0".to_string());
        }
        if self.worker_idle_secs == 0 {
            return Err("Worker idle timeout must be greater than 0".to_string());
        }
        Ok(())
    }

    /// JSON view of the configuration with secrets omitted.
    pub fn to_sanitized_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn worker_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_idle_secs)
    }
}

/// Parse `KEY=VALUE` pairs from an env file without touching the process
/// environment.
pub fn read_env_file(path: &Path) -> AppResult<HashMap<String, String>> {
    let iter = dotenvy::from_path_iter(path).map_err(|e| {
        AppError::config(format!("Failed to read env file {}: {}", path.display(), e))
    })?;

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| {
            AppError::config(format!("Invalid entry in {}: {}", path.display(), e))
        })?;
        vars.insert(key, value);
    }
    Ok(vars)
}

fn parse_var<G, T>(get: &G, key: &str, default: T) -> AppResult<T>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("{} has invalid value '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_chat_ids(raw: &str) -> AppResult<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|e| {
                AppError::config(format!("ALLOWED_CHAT_IDS has invalid id '{}': {}", s, e))
            })
        })
        .collect()
}

fn parse_bool(key: &str, raw: &str) -> AppResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
