//! Bot Gateway
//!
//! Manages the adapter lifecycle and turns incoming messages into replies.
//! Every conversation gets its own worker task fed by an unbounded channel:
//! different conversations are processed in parallel, while messages of one
//! conversation are handled one at a time in arrival order. Workers with no
//! pending messages are dropped after an idle period and respawned on the
//! next message.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::adapters::ChatAdapter;
use super::command_router::CommandRouter;
use super::dispatcher::Dispatcher;
use super::response_mapper::ResponseMapper;
use super::types::{ChatError, GatewayStatus, IncomingMessage};

/// Capacity of the adapter -> gateway channel.
const INBOUND_CHANNEL_CAPACITY: usize = 100;

pub const DEFAULT_WORKER_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Everything a conversation worker needs to answer a message.
struct MessageHandler {
    adapter: Arc<dyn ChatAdapter>,
    dispatcher: Arc<Dispatcher>,
    mapper: ResponseMapper,
}

impl MessageHandler {
    async fn handle(&self, msg: &IncomingMessage) {
        tracing::debug!(
            chat_id = msg.chat_id,
            user_id = msg.user_id,
            username = ?msg.username,
            "Received message"
        );

        let Some(inbound) = CommandRouter::route(msg) else {
            return;
        };

        if let Err(e) = self.adapter.send_typing(msg.chat_id).await {
            tracing::debug!(chat_id = msg.chat_id, error = %e, "Failed to send typing indicator");
        }

        let replies = self.dispatcher.handle(inbound).await;
        for reply in &replies {
            let text = self.mapper.render(reply);
            if let Err(e) = self.adapter.send_message(msg.chat_id, &text).await {
                tracing::warn!(chat_id = msg.chat_id, error = %e, "Failed to send reply");
            }
        }
    }
}

/// Gateway-side handle of one conversation worker.
struct Worker {
    tx: mpsc::UnboundedSender<IncomingMessage>,
    /// Messages sent to the worker and not yet fully handled.
    pending: Arc<AtomicUsize>,
    last_seen: Instant,
}

impl Worker {
    fn is_idle(&self, idle_timeout: Duration) -> bool {
        self.pending.load(Ordering::Acquire) == 0 && self.last_seen.elapsed() >= idle_timeout
    }
}

/// Bot gateway owning the adapter and the message processing loop.
pub struct BotGateway {
    handler: Arc<MessageHandler>,
    status: Arc<RwLock<GatewayStatus>>,
    cancel_token: CancellationToken,
    worker_idle_timeout: Duration,
}

impl BotGateway {
    pub fn new(
        adapter: Arc<dyn ChatAdapter>,
        dispatcher: Arc<Dispatcher>,
        mapper: ResponseMapper,
    ) -> Self {
        Self {
            handler: Arc::new(MessageHandler {
                adapter,
                dispatcher,
                mapper,
            }),
            status: Arc::new(RwLock::new(GatewayStatus::default())),
            cancel_token: CancellationToken::new(),
            worker_idle_timeout: DEFAULT_WORKER_IDLE_TIMEOUT,
        }
    }

    /// How long a conversation worker may sit with nothing to do before it
    /// is dropped.
    pub fn with_worker_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.worker_idle_timeout = idle_timeout;
        self
    }

    /// Get current gateway status.
    pub async fn get_status(&self) -> GatewayStatus {
        let mut status = self.status.read().await.clone();
        status.active_conversations = self.handler.dispatcher.sessions().len().await as u32;
        status
    }

    /// Start the adapter and the message processing loop.
    pub async fn start(&self) -> Result<(), ChatError> {
        if self.cancel_token.is_cancelled() {
            return Err(ChatError::NotEnabled);
        }
        if self.status.read().await.running {
            return Ok(());
        }

        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(INBOUND_CHANNEL_CAPACITY);
        self.handler.adapter.start(tx).await?;

        let handler = self.handler.clone();
        let status_ref = self.status.clone();
        let cancel = self.cancel_token.clone();
        let idle_timeout = self.worker_idle_timeout;

        tokio::spawn(async move {
            let mut workers: HashMap<i64, Worker> = HashMap::new();
            let mut reap = tokio::time::interval(idle_timeout);
            reap.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    Some(msg) = rx.recv() => {
                        Self::record_message(&status_ref, &msg).await;
                        Self::route_to_worker(&mut workers, &handler, &cancel, msg);
                    }
                    _ = reap.tick() => {
                        let before = workers.len();
                        workers.retain(|_, worker| !worker.is_idle(idle_timeout));
                        if workers.len() < before {
                            tracing::debug!(
                                reaped = before - workers.len(),
                                remaining = workers.len(),
                                "Dropped idle conversation workers"
                            );
                        }
                    }
                    _ = cancel.cancelled() => {
                        break;
                    }
                }
                status_ref.write().await.active_workers = workers.len() as u32;
            }
            tracing::debug!(workers = workers.len(), "Gateway loop stopped");
        });

        let mut status = self.status.write().await;
        status.running = true;
        status.connected_since = Some(chrono::Utc::now().to_rfc3339());

        tracing::info!("Bot gateway started");
        Ok(())
    }

    /// Stop the gateway gracefully. Workers finish the message they are
    /// handling and exit.
    pub async fn stop(&self) -> Result<(), ChatError> {
        self.cancel_token.cancel();
        self.handler.adapter.stop().await?;

        let mut status = self.status.write().await;
        status.running = false;
        status.connected_since = None;

        tracing::info!("Bot gateway stopped");
        Ok(())
    }

    async fn record_message(status: &RwLock<GatewayStatus>, msg: &IncomingMessage) {
        let mut s = status.write().await;
        s.total_messages_processed += 1;
        s.last_message_at = Some(msg.timestamp.to_rfc3339());
    }

    /// Hand `msg` to its conversation's worker, spawning one if needed.
    fn route_to_worker(
        workers: &mut HashMap<i64, Worker>,
        handler: &Arc<MessageHandler>,
        cancel: &CancellationToken,
        msg: IncomingMessage,
    ) {
        let chat_id = msg.chat_id;
        let msg = match workers.get_mut(&chat_id) {
            Some(worker) => {
                worker.pending.fetch_add(1, Ordering::AcqRel);
                match worker.tx.send(msg) {
                    Ok(()) => {
                        worker.last_seen = Instant::now();
                        return;
                    }
                    // Worker is gone; respawn below with the same message.
                    Err(mpsc::error::SendError(msg)) => msg,
                }
            }
            None => msg,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(1));
        tokio::spawn(Self::run_worker(
            chat_id,
            rx,
            pending.clone(),
            handler.clone(),
            cancel.clone(),
        ));
        if tx.send(msg).is_err() {
            tracing::warn!(chat_id, "Conversation worker exited before its first message");
            workers.remove(&chat_id);
            return;
        }
        workers.insert(
            chat_id,
            Worker {
                tx,
                pending,
                last_seen: Instant::now(),
            },
        );
        tracing::debug!(chat_id, "Spawned conversation worker");
    }

    /// Handle messages until the gateway drops the sender or shuts down.
    async fn run_worker(
        chat_id: i64,
        mut rx: mpsc::UnboundedReceiver<IncomingMessage>,
        pending: Arc<AtomicUsize>,
        handler: Arc<MessageHandler>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => {
                        handler.handle(&msg).await;
                        pending.fetch_sub(1, Ordering::AcqRel);
                    }
                    None => break,
                },
                _ = cancel.cancelled() => {
                    break;
                }
            }
        }
        tracing::debug!(chat_id, "Conversation worker stopped");
    }
}
