//! Storage Layer
//!
//! Handles data persistence and configuration: the SQLite contact database
//! and the environment-driven bot config.

pub mod config;
pub mod database;

pub use config::*;
pub use database::*;
