//! Command Catalog
//!
//! Every slash command the bot understands. Host queries are grouped under
//! [`HostQuery`] because they share one handler shape: run fixed shell
//! string(s) on the remote host and relay the output.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Read-only queries against the remote host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostQuery {
    Release,
    Uname,
    Uptime,
    Df,
    Free,
    Mpstat,
    W,
    Auths,
    Critical,
    Ps,
    Ss,
    Services,
    ReplLogs,
}

impl HostQuery {
    /// All host queries in menu order.
    pub const ALL: [HostQuery; 13] = [
        HostQuery::Release,
        HostQuery::Uname,
        HostQuery::Uptime,
        HostQuery::Df,
        HostQuery::Free,
        HostQuery::Mpstat,
        HostQuery::W,
        HostQuery::Auths,
        HostQuery::Critical,
        HostQuery::Ps,
        HostQuery::Ss,
        HostQuery::Services,
        HostQuery::ReplLogs,
    ];

    /// Command name without the leading slash.
    pub fn name(self) -> &'static str {
        match self {
            HostQuery::Release => "get_release",
            HostQuery::Uname => "get_uname",
            HostQuery::Uptime => "get_uptime",
            HostQuery::Df => "get_df",
            HostQuery::Free => "get_free",
            HostQuery::Mpstat => "get_mpstat",
            HostQuery::W => "get_w",
            HostQuery::Auths => "get_auths",
            HostQuery::Critical => "get_critical",
            HostQuery::Ps => "get_ps",
            HostQuery::Ss => "get_ss",
            HostQuery::Services => "get_services",
            HostQuery::ReplLogs => "get_repl_logs",
        }
    }

    /// Short description used in the help text.
    pub fn description(self) -> &'static str {
        match self {
            HostQuery::Release => "релиз ОС",
            HostQuery::Uname => "архитектура, имя хоста, версия ядра",
            HostQuery::Uptime => "время работы",
            HostQuery::Df => "состояние файловой системы",
            HostQuery::Free => "состояние оперативной памяти",
            HostQuery::Mpstat => "производительность системы",
            HostQuery::W => "работающие пользователи",
            HostQuery::Auths => "последние 10 входов в систему",
            HostQuery::Critical => "последние 5 критических событий",
            HostQuery::Ps => "запущенные процессы",
            HostQuery::Ss => "используемые порты",
            HostQuery::Services => "запущенные сервисы",
            HostQuery::ReplLogs => "логи репликации",
        }
    }
}

/// A chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BotCommand {
    Start,
    Help,
    FindPhoneNumber,
    GetPhoneNumbers,
    FindEmail,
    GetEmails,
    VerifyPassword,
    GetAptList,
    Host(HostQuery),
}

impl BotCommand {
    /// Every command in menu order.
    pub fn all() -> Vec<BotCommand> {
        let mut commands = vec![
            BotCommand::Start,
            BotCommand::Help,
            BotCommand::FindPhoneNumber,
            BotCommand::GetPhoneNumbers,
            BotCommand::FindEmail,
            BotCommand::GetEmails,
            BotCommand::VerifyPassword,
        ];
        commands.extend(HostQuery::ALL.iter().map(|q| BotCommand::Host(*q)));
        commands.push(BotCommand::GetAptList);
        commands
    }

    /// Command name without the leading slash.
    pub fn name(self) -> &'static str {
        match self {
            BotCommand::Start => "start",
            BotCommand::Help => "help",
            BotCommand::FindPhoneNumber => "find_phone_number",
            BotCommand::GetPhoneNumbers => "get_phone_numbers",
            BotCommand::FindEmail => "find_email",
            BotCommand::GetEmails => "get_emails",
            BotCommand::VerifyPassword => "verify_password",
            BotCommand::GetAptList => "get_apt_list",
            BotCommand::Host(query) => query.name(),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BotCommand::Start => "приветствие",
            BotCommand::Help => "список команд",
            BotCommand::FindPhoneNumber => "найти номера телефонов в тексте",
            BotCommand::GetPhoneNumbers => "номера телефонов из базы данных",
            BotCommand::FindEmail => "найти email в тексте",
            BotCommand::GetEmails => "email из базы данных",
            BotCommand::VerifyPassword => "проверить сложность пароля",
            BotCommand::GetAptList => "установленные пакеты",
            BotCommand::Host(query) => query.description(),
        }
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

impl FromStr for BotCommand {
    type Err = CoreError;

    /// Parse a command name, with or without the leading slash. Names are
    /// case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix('/').unwrap_or(s);
        BotCommand::all()
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| CoreError::parse(format!("unknown command: {}", name)))
    }
}
