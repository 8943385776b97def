//! Configuration Integration Tests
//!
//! Loading `BotConfig` from an env file on disk through `EnvSource`.

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use relay_bot::storage::config::{read_env_file, BotConfig, EnvSource};
use relay_bot::AppError;

fn load(file: &NamedTempFile) -> Result<BotConfig, AppError> {
    let source = EnvSource::read(Some(file.path()))?;
    BotConfig::from_source(&source)
}

fn env_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_read_env_file_parses_pairs() {
    let file = env_file(
        "# bot settings\nTOKEN=123:abc\nRM_HOST=10.0.0.5\nRM_PASSWORD=\"p@ss word\"\n",
    );
    let vars = read_env_file(file.path()).unwrap();
    assert_eq!(vars.get("TOKEN").map(String::as_str), Some("123:abc"));
    assert_eq!(vars.get("RM_HOST").map(String::as_str), Some("10.0.0.5"));
    assert_eq!(vars.get("RM_PASSWORD").map(String::as_str), Some("p@ss word"));
}

#[test]
fn test_load_from_env_file() {
    let file = env_file(
        "TOKEN=123:abc\n\
         RM_HOST=10.0.0.5\n\
         RM_PORT=2222\n\
         RM_USER=deploy\n\
         DB_PATH=/var/lib/relay-bot/contacts.db\n\
         ALLOWED_CHAT_IDS=11,22\n\
         CONFIRM_RETRY=yes\n",
    );
    let config = load(&file).unwrap();

    assert_eq!(config.bot_token, "123:abc");
    assert_eq!(config.remote.destination(), "deploy@10.0.0.5");
    assert_eq!(config.remote.port, 2222);
    assert_eq!(config.remote.password, None);
    assert_eq!(config.db_path, PathBuf::from("/var/lib/relay-bot/contacts.db"));
    assert_eq!(config.allowed_chat_ids, vec![11, 22]);
    assert!(config.confirm_retry);
    assert_eq!(config.max_reply_chars, 4000);

    let json = config.to_sanitized_json().unwrap();
    assert!(!json.contains("123:abc"));
}

#[test]
fn test_load_reports_missing_variable() {
    let file = env_file("TOKEN=123:abc\nRM_HOST=10.0.0.5\n");
    match load(&file) {
        Err(AppError::Config(msg)) => assert!(msg.contains("RM_USER")),
        other => panic!("Expected config error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_load_rejects_bad_port() {
    let file = env_file("TOKEN=t\nRM_HOST=h\nRM_USER=u\nRM_PORT=ssh\n");
    assert!(matches!(
        load(&file),
        Err(AppError::Config(_))
    ));
}
