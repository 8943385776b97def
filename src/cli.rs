//! Command Line Interface
//!
//! `relay-bot [--env-file PATH] [--log-file PATH] [--debug] [run|check]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::services::bot::adapters::telegram::TelegramAdapter;
use crate::services::bot::adapters::ChatAdapter;
use crate::services::bot::{
    BotGateway, DispatchOptions, Dispatcher, ResponseMapper, SessionStore, TelegramAdapterConfig,
};
use crate::services::remote_host::{HostCommands, SshSession};
use crate::storage::config::BotConfig;
use crate::storage::database::Database;

/// Telegram bot relaying commands to text extractors, a contact database
/// and a remote host over SSH.
#[derive(Parser, Debug)]
#[command(
    name = "relay-bot",
    version,
    long_about = r#"Telegram bot relaying commands to text extractors, a contact database and a remote host over SSH.

Configuration is read from the process environment and an env file.

Examples:
  relay-bot                       # Start the bot
  relay-bot check                 # Verify config, database, SSH and bot token
  relay-bot --env-file prod.env   # Use another env file"#
)]
pub struct Cli {
    /// Env file to load (default: .env)
    #[arg(short = 'e', long = "env-file", global = true)]
    pub env_file: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(short = 'l', long = "log-file", global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start the bot (default)
    Run,
    /// Verify the configuration, the database, the SSH connection and the bot token
    Check,
}

impl Cli {
    pub async fn execute(self, config: BotConfig) -> Result<()> {
        match self.command.unwrap_or(Commands::Run) {
            Commands::Run => run(config).await,
            Commands::Check => check(config).await,
        }
    }
}

fn adapter_config(config: &BotConfig) -> TelegramAdapterConfig {
    TelegramAdapterConfig {
        bot_token: Some(config.bot_token.clone()),
        allowed_chat_ids: config.allowed_chat_ids.clone(),
        ..Default::default()
    }
}

async fn run(config: BotConfig) -> Result<()> {
    let db = Database::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    tracing::info!(path = %config.db_path.display(), "Database ready");

    let ssh = Arc::new(SshSession::new(config.remote.clone()));
    ssh.connect()
        .await
        .with_context(|| format!("Failed to connect to {}", config.remote.destination()))?;

    let dispatcher = Dispatcher::new(
        Arc::new(SessionStore::new()),
        ssh.clone(),
        Arc::new(db),
        HostCommands::new(config.remote.repl_log_container.clone()),
        DispatchOptions {
            retry_invalid_confirmation: config.confirm_retry,
            ..Default::default()
        },
    );

    let adapter = Arc::new(TelegramAdapter::new(adapter_config(&config))?);
    let gateway = BotGateway::new(
        adapter,
        Arc::new(dispatcher),
        ResponseMapper::new(config.max_reply_chars),
    )
    .with_worker_idle_timeout(config.worker_idle_timeout());
    gateway.start().await?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Received Ctrl-C, shutting down");

    if let Err(e) = gateway.stop().await {
        tracing::warn!(error = %e, "Gateway did not stop cleanly");
    }
    let status = gateway.get_status().await;
    tracing::info!(
        messages = status.total_messages_processed,
        conversations = status.active_conversations,
        workers = status.active_workers,
        "Bot stopped"
    );
    ssh.close().await;
    Ok(())
}

async fn check(config: BotConfig) -> Result<()> {
    config.validate().map_err(anyhow::Error::msg)?;
    println!("{}", config.to_sanitized_json()?);

    let db = Database::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    anyhow::ensure!(db.is_healthy(), "Database health check failed");
    println!("database: ok");

    let ssh = SshSession::new(config.remote.clone());
    let connected = ssh.connect().await;
    ssh.close().await;
    connected.with_context(|| format!("Failed to connect to {}", config.remote.destination()))?;
    println!("ssh: ok");

    let adapter = TelegramAdapter::new(adapter_config(&config))?;
    adapter.health_check().await?;
    println!("telegram: ok");

    Ok(())
}
