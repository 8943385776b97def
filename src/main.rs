// Relay Bot - Entry Point

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_bot::cli::Cli;
use relay_bot::storage::config::{BotConfig, EnvSource};

#[tokio::main]
async fn main() {
    if let Err(e) = execute().await {
        tracing::error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn execute() -> Result<()> {
    let cli = Cli::parse();
    let source = EnvSource::read(cli.env_file.as_deref())?;

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| source.get("LOG_FILE").filter(|v| !v.trim().is_empty()).map(PathBuf::from));
    init_logging(cli.debug, log_file.as_deref())?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Relay bot starting");
    source.log_origin();

    let config = BotConfig::from_source(&source)?;

    cli.execute(config).await
}

fn init_logging(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let default_filter = if debug { "relay_bot=debug" } else { "relay_bot=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", path.display(), e))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
        }
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}
