//! Response Mapper
//!
//! Renders structured [`Reply`] values into the user-visible (Russian) text.
//! This is the only place error details reach the user.

use relay_bot_core::{ContactKind, HostQuery};

use super::command_router::help_text;
use super::types::{Operation, Prompt, Reply};
use crate::storage::config::DEFAULT_MAX_REPLY_CHARS;
use crate::storage::database::ContactRecord;

const NOTHING_FOUND: &str = "Информация не найдена.";
const NO_RECORDS: &str = "Записей нет.";

/// Response formatter for chat display.
#[derive(Debug, Clone)]
pub struct ResponseMapper {
    /// Limit for replies built from remote command output.
    max_reply_chars: usize,
}

impl Default for ResponseMapper {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REPLY_CHARS)
    }
}

impl ResponseMapper {
    pub fn new(max_reply_chars: usize) -> Self {
        Self { max_reply_chars }
    }

    /// Render a reply to the text sent to the chat.
    pub fn render(&self, reply: &Reply) -> String {
        match reply {
            Reply::Greeting { full_name } => format!("Привет {}!", full_name),
            Reply::Help => help_text(),
            Reply::Prompt(prompt) => Self::format_prompt(*prompt).to_string(),
            Reply::AwaitingCommand => "Жду команду".to_string(),
            Reply::Found { kind, values } => Self::format_found(*kind, values),
            Reply::ConfirmSave(kind) => match kind {
                ContactKind::Phone => "Добавить номера в базу данных? (да/нет)",
                ContactKind::Email => "Добавить email в базу данных? (да/нет)",
            }
            .to_string(),
            Reply::NotFound(kind) => match kind {
                ContactKind::Phone => "Номера телефонов не найдены.",
                ContactKind::Email => "Email не найдены.",
            }
            .to_string(),
            Reply::Saved(kind) => match kind {
                ContactKind::Phone => "Номера добавлены в базу данных.",
                ContactKind::Email => "Email добавлены в базу данных.",
            }
            .to_string(),
            Reply::NothingToSave(kind) => match kind {
                ContactKind::Phone => "Нет номеров для добавления.",
                ContactKind::Email => "Нет email для добавления.",
            }
            .to_string(),
            Reply::SaveCancelled(kind) => match kind {
                ContactKind::Phone => "Добавление номеров отменено.",
                ContactKind::Email => "Добавление email отменено.",
            }
            .to_string(),
            Reply::AnswerYesNo => "\"да\" или \"нет\"".to_string(),
            Reply::Records { records, .. } => Self::format_records(records),
            Reply::PasswordStrength { strong } => {
                if *strong {
                    "Пароль сложный".to_string()
                } else {
                    "Пароль простой".to_string()
                }
            }
            Reply::HostReport { query, outputs } => self.format_host_report(*query, outputs),
            Reply::PackageInfo(output) => {
                if output.is_empty() {
                    NOTHING_FOUND.to_string()
                } else {
                    truncate_chars(output, self.max_reply_chars)
                }
            }
            Reply::Failed { operation, detail } => Self::format_failure(*operation, detail),
        }
    }

    fn format_prompt(prompt: Prompt) -> &'static str {
        match prompt {
            Prompt::PhoneText => "Введите текст для поиска номеров телефонов",
            Prompt::EmailText => "Введите текст для поиска email",
            Prompt::Password => "Введите пароль для проверки",
            Prompt::PackageName => {
                "Введите имя пакета или введите 0, чтобы получить список всех пакетов."
            }
        }
    }

    /// Numbered list, starting at 1.
    fn format_found(kind: ContactKind, values: &[String]) -> String {
        let header = match kind {
            ContactKind::Phone => "Найденные номера телефонов:",
            ContactKind::Email => "Найденные email:",
        };
        let list = values
            .iter()
            .enumerate()
            .map(|(i, value)| format!("{}. {}", i + 1, value))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n{}", header, list)
    }

    /// `{id}. {value}` per stored row.
    fn format_records(records: &[ContactRecord]) -> String {
        if records.is_empty() {
            return NO_RECORDS.to_string();
        }
        records
            .iter()
            .map(|r| format!("{}. {}", r.id, r.value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_host_report(&self, query: HostQuery, outputs: &[String]) -> String {
        if outputs.iter().all(|o| o.is_empty()) {
            return NOTHING_FOUND.to_string();
        }

        let out = |i: usize| outputs.get(i).map(String::as_str).unwrap_or("");
        let text = match query {
            HostQuery::Release => format!("Информация о релизе:\n {}", out(0)),
            HostQuery::Uname => format!(
                "Архитектура цп: {}, Имя хоста: {}, Версия ядра: {}",
                out(0),
                out(1),
                out(2)
            ),
            HostQuery::Uptime => format!("Uptime:  {}", out(0)),
            HostQuery::Ps => format!("Процессы для текущего пользователя:\n{}", out(0)),
            HostQuery::Ss => format!("Открытые порты:\n{}", out(0)),
            HostQuery::Df
            | HostQuery::Free
            | HostQuery::Mpstat
            | HostQuery::W
            | HostQuery::Auths
            | HostQuery::Critical
            | HostQuery::Services
            | HostQuery::ReplLogs => out(0).to_string(),
        };
        truncate_chars(&text, self.max_reply_chars)
    }

    fn format_failure(operation: Operation, detail: &str) -> String {
        match operation {
            Operation::Host(query) => {
                format!("Не удалось получить {}: {}", Self::host_subject(query), detail)
            }
            Operation::ListContacts(ContactKind::Phone) => {
                format!("Не удалось получить номера из таблицы: {}", detail)
            }
            Operation::ListContacts(ContactKind::Email) => {
                format!("Не удалось получить email из таблицы: {}", detail)
            }
            Operation::SaveContacts(ContactKind::Phone) => {
                format!("Не удалось добавить номера в базу данных: {}", detail)
            }
            Operation::SaveContacts(ContactKind::Email) => {
                format!("Не удалось добавить email в базу данных: {}", detail)
            }
            Operation::PackageLookup => format!("Ошибка при выполнении команды: {}", detail),
        }
    }

    /// What the failed host query was trying to get.
    fn host_subject(query: HostQuery) -> &'static str {
        match query {
            HostQuery::Release => "релиз",
            HostQuery::Uname => "uname",
            HostQuery::Uptime => "uptime",
            HostQuery::Df => "информацию о файловой системе",
            HostQuery::Free => "информацию о памяти",
            HostQuery::Mpstat => "информацию о производительности",
            HostQuery::W => "информацию о пользователях",
            HostQuery::Auths => "информацию о входах",
            HostQuery::Critical => "информацию о критических ошибках",
            HostQuery::Ps => "информацию о процессах",
            HostQuery::Ss => "информацию о портах",
            HostQuery::Services => "информацию о сервисах",
            HostQuery::ReplLogs => "информацию о логах репликации",
        }
    }
}

/// First `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(reply: Reply) -> String {
        ResponseMapper::default().render(&reply)
    }

    // -----------------------------------------------------------------------
    // Conversation replies
    // -----------------------------------------------------------------------

    #[test]
    fn test_greeting() {
        let text = render(Reply::Greeting {
            full_name: "Иван Петров".to_string(),
        });
        assert_eq!(text, "Привет Иван Петров!");
    }

    #[test]
    fn test_prompts() {
        assert_eq!(
            render(Reply::Prompt(Prompt::PhoneText)),
            "Введите текст для поиска номеров телефонов"
        );
        assert_eq!(
            render(Reply::Prompt(Prompt::PackageName)),
            "Введите имя пакета или введите 0, чтобы получить список всех пакетов."
        );
    }

    #[test]
    fn test_found_phones_numbered() {
        let text = render(Reply::Found {
            kind: ContactKind::Phone,
            values: vec!["8(999)123-45-67".into(), "+79991234567".into()],
        });
        assert_eq!(
            text,
            "Найденные номера телефонов:\n1. 8(999)123-45-67\n2. +79991234567"
        );
    }

    #[test]
    fn test_found_emails_numbered() {
        let text = render(Reply::Found {
            kind: ContactKind::Email,
            values: vec!["a@b.ru".into()],
        });
        assert_eq!(text, "Найденные email:\n1. a@b.ru");
    }

    #[test]
    fn test_confirmation_texts() {
        assert_eq!(
            render(Reply::ConfirmSave(ContactKind::Phone)),
            "Добавить номера в базу данных? (да/нет)"
        );
        assert_eq!(render(Reply::Saved(ContactKind::Email)), "Email добавлены в базу данных.");
        assert_eq!(
            render(Reply::SaveCancelled(ContactKind::Phone)),
            "Добавление номеров отменено."
        );
        assert_eq!(
            render(Reply::NothingToSave(ContactKind::Phone)),
            "Нет номеров для добавления."
        );
        assert_eq!(render(Reply::AnswerYesNo), "\"да\" или \"нет\"");
    }

    #[test]
    fn test_password_strength() {
        assert_eq!(render(Reply::PasswordStrength { strong: true }), "Пароль сложный");
        assert_eq!(render(Reply::PasswordStrength { strong: false }), "Пароль простой");
    }

    #[test]
    fn test_records() {
        let text = render(Reply::Records {
            kind: ContactKind::Phone,
            records: vec![
                ContactRecord {
                    id: 3,
                    value: "89991234567".into(),
                },
                ContactRecord {
                    id: 7,
                    value: "+79990000000".into(),
                },
            ],
        });
        assert_eq!(text, "3. 89991234567\n7. +79990000000");
    }

    #[test]
    fn test_empty_records() {
        let text = render(Reply::Records {
            kind: ContactKind::Email,
            records: Vec::new(),
        });
        assert_eq!(text, "Записей нет.");
    }

    // -----------------------------------------------------------------------
    // Host output
    // -----------------------------------------------------------------------

    #[test]
    fn test_uname_report() {
        let text = render(Reply::HostReport {
            query: HostQuery::Uname,
            outputs: vec!["x86_64".into(), "db-host".into(), "6.1.0".into()],
        });
        assert_eq!(
            text,
            "Архитектура цп: x86_64, Имя хоста: db-host, Версия ядра: 6.1.0"
        );
    }

    #[test]
    fn test_prefixed_reports() {
        let text = render(Reply::HostReport {
            query: HostQuery::Release,
            outputs: vec!["Ubuntu 22.04".into()],
        });
        assert_eq!(text, "Информация о релизе:\n Ubuntu 22.04");

        let text = render(Reply::HostReport {
            query: HostQuery::Uptime,
            outputs: vec!["up 3 days".into()],
        });
        assert_eq!(text, "Uptime:  up 3 days");

        let text = render(Reply::HostReport {
            query: HostQuery::Ss,
            outputs: vec!["tcp LISTEN".into()],
        });
        assert_eq!(text, "Открытые порты:\ntcp LISTEN");
    }

    #[test]
    fn test_plain_report_and_empty_output() {
        let text = render(Reply::HostReport {
            query: HostQuery::Df,
            outputs: vec!["/dev/sda1 50G".into()],
        });
        assert_eq!(text, "/dev/sda1 50G");

        let text = render(Reply::HostReport {
            query: HostQuery::Critical,
            outputs: vec![String::new()],
        });
        assert_eq!(text, "Информация не найдена.");
    }

    #[test]
    fn test_host_output_is_truncated() {
        let mapper = ResponseMapper::new(10);
        let text = mapper.render(&Reply::HostReport {
            query: HostQuery::W,
            outputs: vec!["абвгдежзийклмн".into()],
        });
        assert_eq!(text, "абвгдежзий");
        assert_eq!(text.chars().count(), 10);
    }

    #[test]
    fn test_package_info() {
        assert_eq!(render(Reply::PackageInfo(String::new())), "Информация не найдена.");

        let long = "x".repeat(5000);
        let text = render(Reply::PackageInfo(long));
        assert_eq!(text.chars().count(), 4000);
    }

    // -----------------------------------------------------------------------
    // Failures
    // -----------------------------------------------------------------------

    #[test]
    fn test_failures() {
        let failed = |operation| {
            render(Reply::Failed {
                operation,
                detail: "boom".into(),
            })
        };
        assert_eq!(
            failed(Operation::Host(HostQuery::Free)),
            "Не удалось получить информацию о памяти: boom"
        );
        assert_eq!(
            failed(Operation::Host(HostQuery::Release)),
            "Не удалось получить релиз: boom"
        );
        assert_eq!(
            failed(Operation::ListContacts(ContactKind::Phone)),
            "Не удалось получить номера из таблицы: boom"
        );
        assert_eq!(
            failed(Operation::SaveContacts(ContactKind::Email)),
            "Не удалось добавить email в базу данных: boom"
        );
        assert_eq!(
            failed(Operation::PackageLookup),
            "Ошибка при выполнении команды: boom"
        );
    }

    // -----------------------------------------------------------------------
    // Truncation
    // -----------------------------------------------------------------------

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello", 2), "he");
        assert_eq!(truncate_chars("привет", 3), "при");
        assert_eq!(truncate_chars("", 3), "");
    }
}
