#![forbid(unsafe_code)]

//! `task-digest-ctl`: command-line companion for the `task-digest` server.
//!
//! Sends one HTTP request to the API and prints the JSON response.

use clap::{Parser, Subcommand};
use reqwest::Method;

#[derive(Debug, Parser)]
#[command(
    name = "task-digest-ctl",
    about = "Command-line client for the task-digest server",
    version,
    long_about = None
)]
struct Cli {
    /// Base URL of the server API.
    #[arg(long, env = "TASK_DIGEST_URL", default_value = "http://127.0.0.1:8080")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate and store a new report.
    Generate {
        /// Owner recorded on the report.
        #[arg(long)]
        user: Option<String>,
    },

    /// List stored reports, newest first.
    List,

    /// Print the newest stored report.
    Latest,

    /// Show overdue tasks.
    Overdue,

    /// Show at-risk tasks.
    AtRisk,

    /// Email a stored report as a PDF.
    Email {
        /// Report id.
        id: String,
        /// Destination; the server default is used when omitted.
        #[arg(long)]
        recipient: Option<String>,
    },

    /// Send overdue alerts and at-risk reminders.
    Alerts,
}

impl Command {
    fn request(&self) -> (Method, String, Option<serde_json::Value>) {
        match self {
            Self::Generate { user } => {
                let body = match user {
                    Some(user) => serde_json::json!({ "user": user }),
                    None => serde_json::json!({}),
                };
                (Method::POST, "/reports".into(), Some(body))
            }
            Self::List => (Method::GET, "/reports".into(), None),
            Self::Latest => (Method::GET, "/reports/latest".into(), None),
            Self::Overdue => (Method::GET, "/tasks/overdue".into(), None),
            Self::AtRisk => (Method::GET, "/tasks/at-risk".into(), None),
            Self::Email { id, recipient } => {
                let path = match recipient {
                    Some(r) => format!("/reports/{id}/email?recipient={}", encode_query(r)),
                    None => format!("/reports/{id}/email"),
                };
                (Method::POST, path, None)
            }
            Self::Alerts => (Method::POST, "/tasks/alerts".into(), None),
        }
    }
}

/// Percent-encode a query value.
fn encode_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Cli::parse();
    let (method, path, body) = args.command.request();
    let url = format!("{}{path}", args.url.trim_end_matches('/'));

    match send(method, &url, body).await {
        Ok((status, response)) if status.is_success() => {
            println!(
                "{}",
                serde_json::to_string_pretty(&response).unwrap_or_default()
            );
        }
        Ok((status, response)) => {
            let message = response
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error");
            eprintln!("Error ({status}): {message}");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("Failed to reach server: {err}");
            eprintln!("Is task-digest running at {}?", args.url);
            std::process::exit(1);
        }
    }
}

/// Send the request and decode the JSON response body.
async fn send(
    method: Method,
    url: &str,
    body: Option<serde_json::Value>,
) -> std::result::Result<(reqwest::StatusCode, serde_json::Value), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    let value = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
    Ok((status, value))
}
