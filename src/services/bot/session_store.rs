//! Session Store
//!
//! In-memory map from conversation id to its [`Session`]. Each conversation
//! has its own mutex, so conversations never block each other; the map
//! itself is only write-locked to insert a new conversation.

use std::collections::HashMap;
use std::sync::Arc;

use relay_bot_core::{ScratchKey, Session, WaitingFor};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

#[derive(Default)]
pub struct SessionStore {
    /// Never pruned: a session carries the pending state and lives as long
    /// as the process.
    sessions: RwLock<HashMap<i64, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, conversation_id: i64) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(&conversation_id) {
            return session.clone();
        }
        self.sessions
            .write()
            .await
            .entry(conversation_id)
            .or_default()
            .clone()
    }

    /// Exclusive access to a conversation's session, created on first use.
    ///
    /// The other accessors take the same lock, so they must not be called
    /// for this conversation while the guard is alive.
    pub async fn lock(&self, conversation_id: i64) -> OwnedMutexGuard<Session> {
        self.entry(conversation_id).await.lock_owned().await
    }

    /// Snapshot of the session.
    pub async fn get(&self, conversation_id: i64) -> Session {
        self.lock(conversation_id).await.clone()
    }

    pub async fn set_waiting(&self, conversation_id: i64, state: WaitingFor) {
        self.lock(conversation_id).await.set_waiting(state);
    }

    pub async fn clear_waiting(&self, conversation_id: i64) {
        self.lock(conversation_id).await.clear_waiting();
    }

    pub async fn stash(&self, conversation_id: i64, key: ScratchKey, values: Vec<String>) {
        self.lock(conversation_id).await.stash(key, values);
    }

    /// Stashed values, empty when nothing was stored under `key`.
    pub async fn fetch(&self, conversation_id: i64, key: ScratchKey) -> Vec<String> {
        self.lock(conversation_id).await.fetch(key)
    }

    /// Number of conversations seen so far.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
