//! Command Router
//!
//! Turns raw chat text into dispatcher events. A message whose first word is
//! a known slash command becomes a command; anything not starting with `/`
//! is free text and passed on verbatim. Unknown slash commands are dropped.

use relay_bot_core::BotCommand;

use super::types::{IncomingMessage, Inbound};

/// Result of parsing one message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    Command(BotCommand),
    Text(String),
    /// A slash command the bot does not know.
    Unknown(String),
}

/// Stateless command parser for chat messages.
pub struct CommandRouter;

impl CommandRouter {
    /// Parse message text.
    ///
    /// - `/find_email` -> Command
    /// - `/find_email@relay_bot extra words` -> Command (suffix and arguments ignored)
    /// - `/reboot` -> Unknown
    /// - anything else -> Text, untouched
    pub fn parse(text: &str) -> ParsedInput {
        let Some(rest) = text.strip_prefix('/') else {
            return ParsedInput::Text(text.to_string());
        };

        let word = rest.split_whitespace().next().unwrap_or("");
        let name = word.split('@').next().unwrap_or(word);

        match name.parse::<BotCommand>() {
            Ok(command) => ParsedInput::Command(command),
            Err(_) => ParsedInput::Unknown(name.to_string()),
        }
    }

    /// Build the dispatcher event for `msg`, or `None` when it should be
    /// ignored.
    pub fn route(msg: &IncomingMessage) -> Option<Inbound> {
        match Self::parse(&msg.text) {
            ParsedInput::Command(command) => Some(Inbound::Command {
                command,
                conversation_id: msg.chat_id,
                full_name: msg.full_name.clone(),
            }),
            ParsedInput::Text(body) => Some(Inbound::Text {
                conversation_id: msg.chat_id,
                body,
            }),
            ParsedInput::Unknown(name) => {
                tracing::debug!(chat_id = msg.chat_id, command = %name, "Ignoring unknown command");
                None
            }
        }
    }
}

/// Help text displayed when user sends /help
pub fn help_text() -> String {
    let mut text = String::from("Доступные команды:\n");
    for command in BotCommand::all() {
        text.push_str(&format!("{} - {}\n", command, command.description()));
    }
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_bot_core::HostQuery;

    fn message(chat_id: i64, text: &str) -> IncomingMessage {
        IncomingMessage {
            chat_id,
            user_id: 1,
            full_name: "Иван Петров".to_string(),
            username: Some("ivan".to_string()),
            text: text.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Slash command parsing
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(
            CommandRouter::parse("/start"),
            ParsedInput::Command(BotCommand::Start)
        );
        assert_eq!(
            CommandRouter::parse("/find_phone_number"),
            ParsedInput::Command(BotCommand::FindPhoneNumber)
        );
        assert_eq!(
            CommandRouter::parse("/get_ss"),
            ParsedInput::Command(BotCommand::Host(HostQuery::Ss))
        );
    }

    #[test]
    fn test_parse_command_with_bot_suffix() {
        assert_eq!(
            CommandRouter::parse("/get_emails@relay_bot"),
            ParsedInput::Command(BotCommand::GetEmails)
        );
    }

    #[test]
    fn test_parse_command_ignores_arguments() {
        assert_eq!(
            CommandRouter::parse("/get_apt_list nginx"),
            ParsedInput::Command(BotCommand::GetAptList)
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            CommandRouter::parse("/reboot now"),
            ParsedInput::Unknown("reboot".to_string())
        );
        assert_eq!(CommandRouter::parse("/"), ParsedInput::Unknown(String::new()));
    }

    // -----------------------------------------------------------------------
    // Plain text
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_plain_text_is_verbatim() {
        assert_eq!(
            CommandRouter::parse("  Да "),
            ParsedInput::Text("  Да ".to_string())
        );
        assert_eq!(CommandRouter::parse(""), ParsedInput::Text(String::new()));
    }

    #[test]
    fn test_parse_text_with_inner_slash() {
        assert_eq!(
            CommandRouter::parse("path /start"),
            ParsedInput::Text("path /start".to_string())
        );
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    #[test]
    fn test_route_command() {
        let inbound = CommandRouter::route(&message(5, "/start")).unwrap();
        assert_eq!(
            inbound,
            Inbound::Command {
                command: BotCommand::Start,
                conversation_id: 5,
                full_name: "Иван Петров".to_string(),
            }
        );
    }

    #[test]
    fn test_route_text() {
        let inbound = CommandRouter::route(&message(5, "89991234567")).unwrap();
        assert_eq!(
            inbound,
            Inbound::Text {
                conversation_id: 5,
                body: "89991234567".to_string(),
            }
        );
    }

    #[test]
    fn test_route_unknown_is_ignored() {
        assert!(CommandRouter::route(&message(5, "/unknown")).is_none());
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = help_text();
        for command in BotCommand::all() {
            assert!(help.contains(&command.to_string()), "{}", command);
        }
    }
}
