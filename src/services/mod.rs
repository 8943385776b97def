//! Services
//!
//! Business logic services for the bot.
//! The bot service handles chat traffic and calls into the remote host service.

pub mod bot;
pub mod remote_host;

pub use bot::{BotGateway, Dispatcher};
pub use remote_host::{HostCommands, RemoteShell, SshSession};
