//! Conversation Flow Integration Tests
//!
//! Drives chat messages through `CommandRouter`, `Dispatcher` and
//! `ResponseMapper` exactly as the gateway does, against a real in-memory
//! SQLite database and a scripted remote shell.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use relay_bot::services::bot::{
    CommandRouter, DispatchOptions, Dispatcher, IncomingMessage, ResponseMapper, SessionStore,
};
use relay_bot::services::remote_host::{HostCommands, RemoteShell, ShellError};
use relay_bot::storage::database::Database;

// ============================================================================
// Helpers
// ============================================================================

#[derive(Default)]
struct ScriptedShell {
    outputs: HashMap<String, Result<String, ShellError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedShell {
    fn respond(mut self, command: &str, output: &str) -> Self {
        self.outputs
            .insert(command.to_string(), Ok(output.to_string()));
        self
    }

    fn fail(mut self, command: &str, error: ShellError) -> Self {
        self.outputs.insert(command.to_string(), Err(error));
        self
    }
}

#[async_trait]
impl RemoteShell for ScriptedShell {
    async fn run(&self, command: &str) -> Result<String, ShellError> {
        self.calls.lock().unwrap().push(command.to_string());
        self.outputs.get(command).cloned().unwrap_or_else(|| {
            Err(ShellError::NonZeroExit {
                code: 127,
                stderr: "command not found".to_string(),
            })
        })
    }
}

struct Bot {
    dispatcher: Dispatcher,
    mapper: ResponseMapper,
    db: Arc<Database>,
    shell: Arc<ScriptedShell>,
}

impl Bot {
    fn new(shell: ScriptedShell) -> Self {
        Self::with_options(shell, DispatchOptions::default())
    }

    fn with_options(shell: ScriptedShell, options: DispatchOptions) -> Self {
        let db = Arc::new(Database::new_in_memory().expect("in-memory database"));
        let shell = Arc::new(shell);
        let dispatcher = Dispatcher::new(
            Arc::new(SessionStore::new()),
            shell.clone(),
            db.clone(),
            HostCommands::new("pg-primary"),
            options,
        );
        Self {
            dispatcher,
            mapper: ResponseMapper::default(),
            db,
            shell,
        }
    }

    /// Send `text` from `chat_id` and collect the rendered replies.
    async fn say(&self, chat_id: i64, text: &str) -> Vec<String> {
        let msg = IncomingMessage {
            chat_id,
            user_id: chat_id,
            full_name: "Анна Смирнова".to_string(),
            username: Some("anna".to_string()),
            text: text.to_string(),
            timestamp: chrono::Utc::now(),
        };
        let Some(inbound) = CommandRouter::route(&msg) else {
            return Vec::new();
        };
        self.dispatcher
            .handle(inbound)
            .await
            .iter()
            .map(|reply| self.mapper.render(reply))
            .collect()
    }
}

// ============================================================================
// Contacts
// ============================================================================

#[tokio::test]
async fn test_phone_search_save_and_list() {
    let bot = Bot::new(ScriptedShell::default());

    assert_eq!(
        bot.say(1, "/find_phone_number").await,
        vec!["Введите текст для поиска номеров телефонов"]
    );
    assert_eq!(
        bot.say(1, "Мой номер 8 (999) 123-45-67, рабочий +7-912-000-11-22")
            .await,
        vec![
            "Найденные номера телефонов:\n1. 8 (999) 123-45-67\n2. +7-912-000-11-22",
            "Добавить номера в базу данных? (да/нет)",
        ]
    );
    assert_eq!(bot.say(1, "Да").await, vec!["Номера добавлены в базу данных."]);

    assert_eq!(
        bot.say(1, "/get_phone_numbers").await,
        vec!["1. 8 (999) 123-45-67\n2. +7-912-000-11-22"]
    );
    assert_eq!(bot.db.list_phones().unwrap().len(), 2);
}

#[tokio::test]
async fn test_email_search_declined() {
    let bot = Bot::new(ScriptedShell::default());

    bot.say(5, "/find_email").await;
    let replies = bot.say(5, "пишите на ivan.petrov@example.com").await;
    assert_eq!(replies[0], "Найденные email:\n1. ivan.petrov@example.com");

    assert_eq!(bot.say(5, "нет").await, vec!["Добавление email отменено."]);
    assert_eq!(bot.say(5, "/get_emails").await, vec!["Записей нет."]);
}

#[tokio::test]
async fn test_nothing_found_returns_to_idle() {
    let bot = Bot::new(ScriptedShell::default());

    bot.say(1, "/find_email").await;
    assert_eq!(bot.say(1, "адресов нет").await, vec!["Email не найдены."]);
    assert_eq!(bot.say(1, "ещё текст").await, vec!["Жду команду"]);
}

#[tokio::test]
async fn test_invalid_answer_with_retry_enabled() {
    let bot = Bot::with_options(
        ScriptedShell::default(),
        DispatchOptions {
            retry_invalid_confirmation: true,
            ..Default::default()
        },
    );

    bot.say(1, "/find_email").await;
    bot.say(1, "a@b.ru").await;
    assert_eq!(bot.say(1, "ага").await, vec!["\"да\" или \"нет\""]);
    assert_eq!(bot.say(1, "да").await, vec!["Email добавлены в базу данных."]);
    assert_eq!(bot.db.list_emails().unwrap().len(), 1);
}

#[tokio::test]
async fn test_conversations_are_independent() {
    let bot = Bot::new(ScriptedShell::default());

    bot.say(1, "/find_phone_number").await;
    bot.say(2, "/verify_password").await;

    assert_eq!(bot.say(2, "Qwerty1!").await, vec!["Пароль сложный"]);
    assert_eq!(
        bot.say(1, "89990001122").await[1],
        "Добавить номера в базу данных? (да/нет)"
    );
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn test_start_help_and_unknown() {
    let bot = Bot::new(ScriptedShell::default());

    assert_eq!(bot.say(1, "/start").await, vec!["Привет Анна Смирнова!"]);

    let help = bot.say(1, "/help@relay_bot").await;
    assert_eq!(help.len(), 1);
    assert!(help[0].contains("/get_repl_logs"));
    assert!(help[0].contains("/verify_password"));

    assert!(bot.say(1, "/shutdown").await.is_empty());
}

#[tokio::test]
async fn test_password_check() {
    let bot = Bot::new(ScriptedShell::default());

    assert_eq!(
        bot.say(1, "/verify_password").await,
        vec!["Введите пароль для проверки"]
    );
    assert_eq!(bot.say(1, "password").await, vec!["Пароль простой"]);
    assert_eq!(bot.say(1, "Qwerty1!").await, vec!["Жду команду"]);
}

// ============================================================================
// Remote host
// ============================================================================

#[tokio::test]
async fn test_host_reports() {
    let shell = ScriptedShell::default()
        .respond("uname -p", "x86_64")
        .respond("uname -n", "db01")
        .respond("uname -r", "6.8.0")
        .respond("lsb_release -a", "Distributor ID: Ubuntu")
        .respond("journalctl --priority=crit | tail -n 5", "");
    let bot = Bot::new(shell);

    assert_eq!(
        bot.say(1, "/get_uname").await,
        vec!["Архитектура цп: x86_64, Имя хоста: db01, Версия ядра: 6.8.0"]
    );
    assert_eq!(
        bot.say(1, "/get_release").await,
        vec!["Информация о релизе:\n Distributor ID: Ubuntu"]
    );
    assert_eq!(bot.say(1, "/get_critical").await, vec!["Информация не найдена."]);
}

#[tokio::test]
async fn test_repl_logs_use_configured_container() {
    let shell = ScriptedShell::default().respond(
        "docker logs pg-primary | grep checkpoint | tail -n 5",
        "checkpoint complete",
    );
    let bot = Bot::new(shell);

    assert_eq!(bot.say(1, "/get_repl_logs").await, vec!["checkpoint complete"]);
}

#[tokio::test]
async fn test_host_failure_is_reported() {
    let shell = ScriptedShell::default().fail("free -h", ShellError::Timeout(30));
    let bot = Bot::new(shell);

    let replies = bot.say(1, "/get_free").await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("Не удалось получить информацию о памяти: "));
}

#[tokio::test]
async fn test_package_lookup() {
    let shell = ScriptedShell::default()
        .respond("apt list --installed | cut -d/ -f1", "bash\ncoreutils")
        .respond("apt show nginx", "Package: nginx\nVersion: 1.24");
    let bot = Bot::new(shell);

    assert_eq!(
        bot.say(1, "/get_apt_list").await,
        vec!["Введите имя пакета или введите 0, чтобы получить список всех пакетов."]
    );
    assert_eq!(bot.say(1, "0").await, vec!["bash\ncoreutils"]);

    bot.say(1, "/get_apt_list").await;
    assert_eq!(bot.say(1, "nginx").await, vec!["Package: nginx\nVersion: 1.24"]);

    bot.say(1, "/get_apt_list").await;
    bot.say(1, "nginx && rm -rf /").await;
    assert_eq!(
        bot.shell.calls.lock().unwrap().last().map(String::as_str),
        Some("apt show 'nginx && rm -rf /'")
    );
}
