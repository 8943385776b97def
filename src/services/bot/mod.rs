//! Telegram Bot
//!
//! Relays chat commands to the contact extractors, the contact database and
//! the remote host.
//!
//! ## Architecture
//!
//! ```text
//! Telegram → ChatAdapter → mpsc → BotGateway → per-chat worker
//!                                                  ↓
//!                                        CommandRouter.route()
//!                                                  ↓
//!                                        Dispatcher (waiting_for state machine)
//!                                                  ↓
//!                                        ResponseMapper → ChatAdapter.send_message()
//! ```

pub mod adapters;
pub mod command_router;
pub mod dispatcher;
pub mod gateway;
pub mod response_mapper;
pub mod session_store;
pub mod types;

pub use command_router::{CommandRouter, ParsedInput};
pub use dispatcher::Dispatcher;
pub use gateway::BotGateway;
pub use response_mapper::ResponseMapper;
pub use session_store::SessionStore;
pub use types::*;
