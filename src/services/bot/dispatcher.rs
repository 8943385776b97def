//! Dispatcher
//!
//! The conversation state machine. A command always succeeds in moving the
//! session: prompting commands set `waiting_for`, every other command
//! resets it. Free text is interpreted according to `waiting_for`.
//!
//! The session lock is held for the whole handling of one event, so two
//! messages of the same conversation can never interleave.

use std::sync::Arc;

use relay_bot_core::{
    check_password_strength, extract_emails, extract_phones, BotCommand, ContactKind, HostQuery,
    Session, WaitingFor,
};

use super::session_store::SessionStore;
use super::types::{DispatchOptions, Inbound, Operation, Prompt, Reply};
use crate::services::remote_host::{HostCommands, RemoteShell};
use crate::storage::database::ContactStore;
use crate::utils::error::{AppError, AppResult};

const ANSWER_YES: &str = "да";
const ANSWER_NO: &str = "нет";

pub struct Dispatcher {
    sessions: Arc<SessionStore>,
    shell: Arc<dyn RemoteShell>,
    store: Arc<dyn ContactStore>,
    commands: HostCommands,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(
        sessions: Arc<SessionStore>,
        shell: Arc<dyn RemoteShell>,
        store: Arc<dyn ContactStore>,
        commands: HostCommands,
        options: DispatchOptions,
    ) -> Self {
        Self {
            sessions,
            shell,
            store,
            commands,
            options,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one event and return the replies to send, in order.
    pub async fn handle(&self, event: Inbound) -> Vec<Reply> {
        let mut session = self.sessions.lock(event.conversation_id()).await;

        match event {
            Inbound::Command {
                command,
                conversation_id,
                full_name,
            } => {
                tracing::info!(chat_id = conversation_id, "/{} command called", command.name());
                self.on_command(&mut session, command, full_name).await
            }
            Inbound::Text {
                conversation_id,
                body,
            } => {
                tracing::debug!(
                    chat_id = conversation_id,
                    state = %session.waiting_for,
                    "Handling free text"
                );
                self.on_text(&mut session, &body).await
            }
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn on_command(
        &self,
        session: &mut Session,
        command: BotCommand,
        full_name: String,
    ) -> Vec<Reply> {
        let reply = match command {
            BotCommand::FindPhoneNumber => {
                return self.prompt(session, ContactKind::Phone.search_state(), Prompt::PhoneText)
            }
            BotCommand::FindEmail => {
                return self.prompt(session, ContactKind::Email.search_state(), Prompt::EmailText)
            }
            BotCommand::VerifyPassword => {
                return self.prompt(session, WaitingFor::Password, Prompt::Password)
            }
            BotCommand::GetAptList => {
                return self.prompt(session, WaitingFor::AptList, Prompt::PackageName)
            }
            BotCommand::Start => Reply::Greeting { full_name },
            BotCommand::Help => Reply::Help,
            BotCommand::GetPhoneNumbers => self.list_contacts(ContactKind::Phone).await,
            BotCommand::GetEmails => self.list_contacts(ContactKind::Email).await,
            BotCommand::Host(query) => self.host_query(query).await,
        };

        self.leave_state(session);
        vec![reply]
    }

    fn prompt(&self, session: &mut Session, state: WaitingFor, prompt: Prompt) -> Vec<Reply> {
        self.leave_state(session);
        session.set_waiting(state);
        vec![Reply::Prompt(prompt)]
    }

    /// Run a store call on the blocking pool. rusqlite may wait on the
    /// busy timeout, which must not stall the async workers.
    async fn with_store<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&dyn ContactStore) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| AppError::database(format!("Database task failed: {}", e)))?
    }

    async fn list_contacts(&self, kind: ContactKind) -> Reply {
        match self.with_store(move |store| store.list(kind)).await {
            Ok(records) => Reply::Records { kind, records },
            Err(e) => {
                tracing::error!(table = kind.table(), error = %e, "Failed to list contacts");
                Reply::Failed {
                    operation: Operation::ListContacts(kind),
                    detail: e.to_string(),
                }
            }
        }
    }

    async fn host_query(&self, query: HostQuery) -> Reply {
        let mut outputs = Vec::new();
        for command in self.commands.commands(query) {
            match self.shell.run(&command).await {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    tracing::warn!(query = query.name(), error = %e, "Host query failed");
                    return Reply::Failed {
                        operation: Operation::Host(query),
                        detail: e.to_string(),
                    };
                }
            }
        }
        Reply::HostReport { query, outputs }
    }

    // ========================================================================
    // Free text
    // ========================================================================

    async fn on_text(&self, session: &mut Session, body: &str) -> Vec<Reply> {
        match session.waiting_for {
            WaitingFor::None => vec![Reply::AwaitingCommand],
            WaitingFor::PhoneNumber => Self::search(session, ContactKind::Phone, body),
            WaitingFor::Email => Self::search(session, ContactKind::Email, body),
            WaitingFor::ConfirmationPhone => self.confirm(session, ContactKind::Phone, body).await,
            WaitingFor::ConfirmationEmail => self.confirm(session, ContactKind::Email, body).await,
            WaitingFor::Password => {
                session.clear_waiting();
                vec![Reply::PasswordStrength {
                    strong: check_password_strength(body),
                }]
            }
            WaitingFor::AptList => {
                session.clear_waiting();
                vec![self.package_lookup(body).await]
            }
        }
    }

    /// Extract contacts of `kind` and either ask to save them or report none.
    fn search(session: &mut Session, kind: ContactKind, body: &str) -> Vec<Reply> {
        let values = match kind {
            ContactKind::Phone => extract_phones(body),
            ContactKind::Email => extract_emails(body),
        };

        if values.is_empty() {
            session.clear_waiting();
            return vec![Reply::NotFound(kind)];
        }

        session.stash(kind.scratch_key(), values.clone());
        session.set_waiting(kind.confirmation_state());
        vec![Reply::Found { kind, values }, Reply::ConfirmSave(kind)]
    }

    async fn confirm(&self, session: &mut Session, kind: ContactKind, body: &str) -> Vec<Reply> {
        let answer = body.to_lowercase();

        let reply = match answer.as_str() {
            ANSWER_YES => {
                let values = session.fetch(kind.scratch_key());
                if values.is_empty() {
                    Reply::NothingToSave(kind)
                } else {
                    match self.with_store(move |store| store.insert(kind, &values)).await {
                        Ok(count) => {
                            tracing::info!(table = kind.table(), count, "Saved contacts");
                            Reply::Saved(kind)
                        }
                        Err(e) => {
                            tracing::error!(table = kind.table(), error = %e, "Failed to save contacts");
                            Reply::Failed {
                                operation: Operation::SaveContacts(kind),
                                detail: e.to_string(),
                            }
                        }
                    }
                }
            }
            ANSWER_NO => Reply::SaveCancelled(kind),
            _ if self.options.retry_invalid_confirmation => return vec![Reply::AnswerYesNo],
            _ => Reply::AnswerYesNo,
        };

        self.leave_state(session);
        vec![reply]
    }

    async fn package_lookup(&self, body: &str) -> Reply {
        let command = self.commands.apt_command(body);
        match self.shell.run(&command).await {
            Ok(output) => Reply::PackageInfo(output),
            Err(e) => {
                tracing::warn!(error = %e, "Package lookup failed");
                Reply::Failed {
                    operation: Operation::PackageLookup,
                    detail: e.to_string(),
                }
            }
        }
    }

    /// Reset `waiting_for`, dropping stashed contacts when leaving a
    /// confirmation step.
    fn leave_state(&self, session: &mut Session) {
        if self.options.clear_stash_after_confirmation && session.waiting_for.is_confirmation() {
            for kind in [ContactKind::Phone, ContactKind::Email] {
                session.clear_stash(kind.scratch_key());
            }
        }
        session.clear_waiting();
    }
}
