//! Unit tests for secret loading with env-var fallback.
//!
//! These tests mutate process-global env vars and run serially.

use task_digest::config::GlobalConfig;

const ENV_KEYS: [&str; 4] = [
    "NOTION_API_KEY",
    "SUMMARIZER_API_KEY",
    "SMTP_PASSWORD",
    "SLACK_BOT_TOKEN",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

fn config(notify: &str) -> GlobalConfig {
    let toml = format!(
        "[source]\ndatabase_id = \"db\"\n\n[notify]\n{notify}\n"
    );
    GlobalConfig::from_toml_str(&toml).expect("config parses")
}

#[tokio::test]
#[serial_test::serial]
async fn env_vars_populate_api_keys() {
    clear_env();
    std::env::set_var("NOTION_API_KEY", "secret_notion");
    std::env::set_var("SUMMARIZER_API_KEY", "sk-test");

    let mut config = config("");
    config.load_credentials().await.expect("credentials load");

    assert_eq!(config.source.api_key.as_deref(), Some("secret_notion"));
    assert_eq!(config.summarizer.api_key.as_deref(), Some("sk-test"));
    clear_env();
}

#[tokio::test]
#[serial_test::serial]
async fn missing_credentials_are_not_fatal() {
    clear_env();
    let mut config = config("");
    config.load_credentials().await.expect("credentials load");
    assert!(config.source.api_key.is_none());
    assert!(config.summarizer.api_key.is_none());
}

#[tokio::test]
#[serial_test::serial]
async fn empty_env_var_counts_as_missing() {
    clear_env();
    std::env::set_var("NOTION_API_KEY", "");
    let mut config = config("");
    config.load_credentials().await.expect("credentials load");
    assert!(config.source.api_key.is_none());
    clear_env();
}

#[tokio::test]
#[serial_test::serial]
async fn smtp_password_loads_for_email_transport() {
    clear_env();
    std::env::set_var("SMTP_PASSWORD", "hunter2");
    let mut config = config("transport = \"email\"\n[notify.smtp]\nfrom = \"digest@example.com\"");
    config.load_credentials().await.expect("credentials load");
    let smtp = config.notify.smtp.expect("smtp section");
    assert_eq!(smtp.password.as_deref(), Some("hunter2"));
    clear_env();
}

#[tokio::test]
#[serial_test::serial]
async fn slack_token_loads_only_for_slack_transport() {
    clear_env();
    std::env::set_var("SLACK_BOT_TOKEN", "xoxb-test");

    let mut none = config("");
    none.load_credentials().await.expect("credentials load");
    assert!(none.notify.slack.bot_token.is_empty());

    let mut slack = config("transport = \"slack\"");
    slack.load_credentials().await.expect("credentials load");
    assert_eq!(slack.notify.slack.bot_token, "xoxb-test");
    clear_env();
}
