//! Integration Tests Module
//!
//! End-to-end tests through the public API of the relay bot: whole
//! conversations driven through the dispatcher and the response mapper,
//! contact persistence in a file-backed database, and env-file config
//! loading. The remote host is replaced by an in-process fake shell.

// Conversation flows from command to rendered reply
mod conversation_flow_test;

// Contact persistence across database reopen
mod contact_storage_test;

// Env file and environment configuration
mod config_test;
