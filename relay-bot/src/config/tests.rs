//! Config tests.

use super::{BotDescriptor, RelayConfig, RunPollConfig, DEFAULT_FAILURE_REPLY};
use crate::error::ConfigError;
use std::time::Duration;
use tempfile::TempDir;

const LEGACY_CONFIG: &str = r#"{
    "apiKey": "sk-test-0123456789abcdef",
    "assistantID": "asst_abc",
    "managerBotToken": "111:manager-token-value",
    "botTokens": [
        {"name": "alpha_bot", "token": "222:alpha-token-value"},
        {"name": "beta_bot", "token": "333:beta-token-value"}
    ],
    "threadsFileName": "threads.json"
}"#;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.json");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_load_legacy_config_with_defaults() {
    let dir = TempDir::new().unwrap();
    let config = RelayConfig::load(write_config(&dir, LEGACY_CONFIG)).unwrap();

    assert_eq!(config.api_key, "sk-test-0123456789abcdef");
    assert_eq!(config.assistant_id, "asst_abc");
    assert_eq!(config.manager_bot_token, "111:manager-token-value");
    assert_eq!(config.bot_tokens.len(), 2);
    assert_eq!(config.bot("beta_bot").unwrap().token, "333:beta-token-value");
    assert_eq!(config.threads_file_name, "threads.json");
    assert_eq!(config.log_file_name, "log.txt");
    assert_eq!(config.api_base_url, "https://api.openai.com/v1");
    assert!(config.admin_chat_ids.is_empty());
    assert_eq!(config.failure_reply.as_str(), DEFAULT_FAILURE_REPLY);
    assert_eq!(config.run_poll, RunPollConfig::default());
    assert!(!config.persist_added_bots);
}

#[test]
fn test_load_custom_optional_fields() {
    let dir = TempDir::new().unwrap();
    let body = r#"{
        "apiKey": "k", "assistantID": "a", "managerBotToken": "m",
        "adminChatIds": [7, -100123],
        "failureReply": "",
        "runPoll": {"initialIntervalMs": 10, "timeoutSecs": 3},
        "persistAddedBots": true
    }"#;
    let config = RelayConfig::load(write_config(&dir, body)).unwrap();

    assert!(config.is_admin(7));
    assert!(config.is_admin(-100123));
    assert!(!config.is_admin(8));
    assert!(config.failure_reply().is_none());
    assert!(config.persist_added_bots);

    let policy = config.run_poll.to_policy();
    assert_eq!(policy.initial_interval, Duration::from_millis(10));
    assert_eq!(policy.max_interval, Duration::from_secs(5));
    assert_eq!(policy.timeout, Duration::from_secs(3));
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = TempDir::new().unwrap();
    let err = RelayConfig::load(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let err = RelayConfig::load(write_config(&dir, "{\"apiKey\": ")).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));

    let err = RelayConfig::load(write_config(&dir, r#"{"apiKey": "k"}"#)).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = RelayConfig::new("k", "a", "m");
    assert!(config.validate().is_ok());

    config.assistant_id = "  ".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = RelayConfig::new("k", "a", "m");
    config.bot_tokens = vec![BotDescriptor::new("a", "1"), BotDescriptor::new("a", "2")];
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate bot name"));

    let mut config = RelayConfig::new("k", "a", "m");
    config.api_base_url = "not a url".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = RelayConfig::new("k", "a", "m");
    config.run_poll.max_interval_ms = 1;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_write_then_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    let mut config = RelayConfig::new("k", "a", "m");
    config.bot_tokens.push(BotDescriptor::new("gamma_bot", "444:gamma"));
    config.admin_chat_ids.push(42);

    config.write(&path).unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\n  \"apiKey\": \"k\""));
    assert!(raw.contains("\"assistantID\": \"a\""));

    assert_eq!(RelayConfig::load(&path).unwrap(), config);
}

#[test]
fn test_debug_masks_secrets() {
    let mut config = RelayConfig::new("sk-secret-0123456789", "asst", "999:manager-secret");
    config
        .bot_tokens
        .push(BotDescriptor::new("alpha_bot", "222:alpha-secret-token"));

    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("sk-secret-0123456789"));
    assert!(!rendered.contains("manager-secret"));
    assert!(!rendered.contains("alpha-secret-token"));
    assert!(rendered.contains("alpha_bot"));
}
