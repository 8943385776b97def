//! Host Command Catalog
//!
//! The exact shell strings behind every host query and the package lookup.

use relay_bot_core::HostQuery;

/// Package lookup input that lists every installed package.
pub const APT_LIST_ALL: &str = "0";

/// Resolves commands to shell strings. Only the replication log container
/// name is configurable.
#[derive(Debug, Clone)]
pub struct HostCommands {
    repl_log_container: String,
}

impl HostCommands {
    pub fn new(repl_log_container: impl Into<String>) -> Self {
        Self {
            repl_log_container: repl_log_container.into(),
        }
    }

    /// Shell strings for `query`, run in order. Only `uname` needs more
    /// than one.
    pub fn commands(&self, query: HostQuery) -> Vec<String> {
        match query {
            HostQuery::Release => vec!["lsb_release -a".to_string()],
            HostQuery::Uname => vec![
                "uname -p".to_string(),
                "uname -n".to_string(),
                "uname -r".to_string(),
            ],
            HostQuery::Uptime => vec!["uptime".to_string()],
            HostQuery::Df => vec!["df -h".to_string()],
            HostQuery::Free => vec!["free -h".to_string()],
            HostQuery::Mpstat => vec!["mpstat".to_string()],
            HostQuery::W => vec!["w".to_string()],
            HostQuery::Auths => vec![
                "cat /var/log/auth.log | grep 'New' | grep -v 'Debian-gdm' | tail -n 10".to_string(),
            ],
            HostQuery::Critical => vec!["journalctl --priority=crit | tail -n 5".to_string()],
            HostQuery::Ps => vec!["ps au".to_string()],
            HostQuery::Ss => {
                vec![r#"ss -tulnp | awk '{print $1,"  "$2,"  "$5,"  "$7}'"#.to_string()]
            }
            HostQuery::Services => vec![
                r#"systemctl | grep ".service" | grep "running" | awk {'print $1'}"#.to_string(),
            ],
            HostQuery::ReplLogs => vec![format!(
                "docker logs {} | grep checkpoint | tail -n 5",
                shell_quote(&self.repl_log_container)
            )],
        }
    }

    /// Shell string for a package lookup. `0` lists every installed
    /// package; anything else is passed to `apt show` as one argument.
    pub fn apt_command(&self, input: &str) -> String {
        if input == APT_LIST_ALL {
            "apt list --installed | cut -d/ -f1".to_string()
        } else {
            format!("apt show {}", shell_quote(input))
        }
    }
}

impl Default for HostCommands {
    fn default() -> Self {
        Self::new(crate::storage::config::DEFAULT_REPL_LOG_CONTAINER)
    }
}

/// Quote `value` as a single POSIX shell word.
///
/// Plain words made of safe characters are returned unchanged.
pub fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.+:/=@%,".contains(c));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
