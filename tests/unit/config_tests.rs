use std::time::Duration;

use task_digest::config::{GlobalConfig, NotifyTransport};
use task_digest::AppError;

const MINIMAL: &str = r#"
[source]
database_id = "db-1"
"#;

fn full_toml() -> &'static str {
    r#"
http_port = 9000
default_owner = "pm"
risk_window_days = 3
db_path = "var/reports.db"
retention_days = 30

[source]
database_id = "db-1"
page_size = 50

[summarizer]
base_url = "http://localhost:11434/v1"
model = "llama3"
temperature = 0.2

[timeouts]
source_seconds = 5
summarizer_seconds = 10
stream_idle_seconds = 4
notify_seconds = 6

[scheduler]
enabled = true
interval_minutes = 15
owner_user = "bot"
report_recipients = ["lead@example.com"]
send_deadline_alerts = true

[notify]
transport = "email"
default_recipient = "team@example.com"

[notify.smtp]
host = "smtp.example.com"
port = 2525
from = "digest@example.com"
"#
}

#[test]
fn minimal_config_uses_defaults() {
    let config = GlobalConfig::from_toml_str(MINIMAL).expect("config parses");
    assert_eq!(config.http_port, 8080);
    assert_eq!(config.default_owner, "anonymous");
    assert_eq!(config.risk_window_days, 2);
    assert_eq!(config.retention_days, 90);
    assert_eq!(config.source.page_size, 100);
    assert_eq!(config.source.base_url, "https://api.notion.com/v1");
    assert_eq!(config.timeouts.source(), Duration::from_secs(20));
    assert_eq!(config.timeouts.stream_idle(), Duration::from_secs(30));
    assert!(!config.scheduler.enabled);
    assert_eq!(config.notify.transport, NotifyTransport::None);
    assert!(config.source.api_key.is_none());
}

#[test]
fn full_config_round_trips_every_section() {
    let config = GlobalConfig::from_toml_str(full_toml()).expect("config parses");
    assert_eq!(config.http_port, 9000);
    assert_eq!(config.default_owner, "pm");
    assert_eq!(config.risk_window_days, 3);
    assert_eq!(config.retention_days, 30);
    assert_eq!(config.source.page_size, 50);
    assert_eq!(config.summarizer.model, "llama3");
    assert_eq!(config.timeouts.notify(), Duration::from_secs(6));
    assert!(config.scheduler.enabled);
    assert_eq!(config.scheduler_interval(), Duration::from_secs(900));
    assert_eq!(config.scheduler.report_recipients, vec!["lead@example.com"]);
    assert_eq!(config.notify.transport, NotifyTransport::Email);
    let smtp = config.notify.smtp.expect("smtp section");
    assert_eq!(smtp.port, 2525);
    assert_eq!(smtp.username, None);
}

#[test]
fn secrets_in_toml_are_ignored() {
    let toml = r#"
[source]
database_id = "db-1"
api_key = "should-not-load"
"#;
    let config = GlobalConfig::from_toml_str(toml).expect("config parses");
    assert!(config.source.api_key.is_none());
}

#[test]
fn missing_source_section_is_rejected() {
    let err = GlobalConfig::from_toml_str("http_port = 1").expect_err("must fail");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn blank_database_id_is_rejected() {
    let err = GlobalConfig::from_toml_str("[source]\ndatabase_id = \"  \"\n").expect_err("must fail");
    assert!(err.to_string().contains("database_id"));
}

#[test]
fn page_size_out_of_range_is_rejected() {
    let toml = "[source]\ndatabase_id = \"db\"\npage_size = 500\n";
    assert!(GlobalConfig::from_toml_str(toml).is_err());
}

#[test]
fn risk_window_above_ten_years_is_rejected() {
    let toml = "risk_window_days = 3651\n[source]\ndatabase_id = \"db\"\n";
    let err = GlobalConfig::from_toml_str(toml).expect_err("must fail");
    assert!(matches!(err, AppError::Config(_)));
    assert!(err.to_string().contains("risk_window_days"));

    let toml = "risk_window_days = 3650\n[source]\ndatabase_id = \"db\"\n";
    let config = GlobalConfig::from_toml_str(toml).expect("upper bound accepted");
    assert_eq!(config.risk_window_days, 3650);
}

#[test]
fn zero_timeout_is_rejected() {
    let toml = "[source]\ndatabase_id = \"db\"\n[timeouts]\nsource_seconds = 0\n";
    let err = GlobalConfig::from_toml_str(toml).expect_err("must fail");
    assert!(err.to_string().contains("timeouts"));
}

#[test]
fn enabled_scheduler_needs_an_interval() {
    let toml = "[source]\ndatabase_id = \"db\"\n[scheduler]\nenabled = true\ninterval_minutes = 0\n";
    assert!(GlobalConfig::from_toml_str(toml).is_err());
}

#[test]
fn email_transport_requires_smtp_section() {
    let toml = "[source]\ndatabase_id = \"db\"\n[notify]\ntransport = \"email\"\n";
    let err = GlobalConfig::from_toml_str(toml).expect_err("must fail");
    assert!(err.to_string().contains("notify.smtp"));
}

#[test]
fn unknown_transport_is_rejected() {
    let toml = "[source]\ndatabase_id = \"db\"\n[notify]\ntransport = \"pager\"\n";
    assert!(GlobalConfig::from_toml_str(toml).is_err());
}

#[test]
fn load_from_path_reads_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("config.toml");
    std::fs::write(&path, MINIMAL).expect("write config");
    let config = GlobalConfig::load_from_path(&path).expect("config loads");
    assert_eq!(config.source.database_id, "db-1");
}

#[test]
fn load_from_missing_path_is_config_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let err = GlobalConfig::load_from_path(temp.path().join("absent.toml")).expect_err("must fail");
    assert!(err.to_string().starts_with("config:"));
}
