//! Provider payload normalization.
//!
//! Accepts either a raw Notion page object (anything carrying a
//! `properties` map) or a flat record with top-level fields. Missing
//! or malformed fields never fail normalization; each falls back to the
//! documented default on [`Task`].

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::models::task::{Task, TaskStatus, UNASSIGNED, UNTITLED};

/// Result of normalizing a batch of provider records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    /// Canonical tasks in provider order.
    pub tasks: Vec<Task>,
    /// Records whose due date was present but not a valid `YYYY-MM-DD` date.
    pub invalid_dates: usize,
}

/// Normalize a single provider record.
#[must_use]
pub fn normalize(raw: &Value) -> Task {
    normalize_record(raw).0
}

/// Normalize a batch of records, counting discarded due dates.
#[must_use]
pub fn normalize_all(raws: &[Value]) -> NormalizedBatch {
    let mut batch = NormalizedBatch {
        tasks: Vec::with_capacity(raws.len()),
        invalid_dates: 0,
    };
    for raw in raws {
        let (task, invalid_date) = normalize_record(raw);
        if invalid_date {
            batch.invalid_dates += 1;
        }
        batch.tasks.push(task);
    }
    batch
}

/// Parse a strict ISO `YYYY-MM-DD` date.
///
/// Returns `None` for anything else, including full timestamps.
#[must_use]
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let shaped = trimmed.len() == 10
        && trimmed.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// Raw fields pulled out of a provider record before defaults apply.
#[derive(Default)]
struct Extracted {
    id: Option<String>,
    title: Option<String>,
    status: Option<String>,
    assignee_name: Option<String>,
    assignee_contact: Option<String>,
    due_date: Option<String>,
    priority: Option<String>,
    url: Option<String>,
}

fn normalize_record(raw: &Value) -> (Task, bool) {
    let fields = match raw.get("properties").filter(|p| p.is_object()) {
        Some(props) => extract_notion(raw, props),
        None => extract_flat(raw),
    };

    let (due_date, invalid_date) = match fields.due_date.as_deref() {
        None => (None, false),
        Some(text) => match parse_due_date(text) {
            Some(date) => (Some(date), false),
            None => {
                debug!(due_date = text, "discarding unparseable due date");
                (None, true)
            }
        },
    };

    let status = fields
        .status
        .as_deref()
        .map_or(TaskStatus::Unknown, TaskStatus::from_label);

    let task = Task::new(fields.title.unwrap_or_else(|| UNTITLED.to_owned()), status)
        .with_id(fields.id)
        .with_assignee(
            fields.assignee_name.unwrap_or_else(|| UNASSIGNED.to_owned()),
            fields.assignee_contact,
        )
        .with_due_date(due_date)
        .with_priority(fields.priority.unwrap_or_default())
        .with_source_url(fields.url);

    (task, invalid_date)
}

fn extract_notion(page: &Value, props: &Value) -> Extracted {
    let (assignee_name, assignee_contact) = notion_assignee(props.get("Assignee"));
    Extracted {
        id: string_at(page, &["id"]),
        title: props
            .get("Name")
            .and_then(|name| name.get("title"))
            .and_then(join_plain_text),
        status: string_at(props, &["Status", "select", "name"])
            .or_else(|| string_at(props, &["Status", "status", "name"])),
        assignee_name,
        assignee_contact,
        due_date: string_at(props, &["Due Date", "date", "start"]),
        priority: string_at(props, &["Priority", "select", "name"]),
        url: string_at(page, &["url"]),
    }
}

/// Resolve a Notion `Assignee` property to `(name, contact)`.
///
/// `people` properties carry the first person's name and email;
/// `rich_text` properties carry a bare name with no contact.
fn notion_assignee(prop: Option<&Value>) -> (Option<String>, Option<String>) {
    let Some(prop) = prop else {
        return (None, None);
    };

    if let Some(person) = prop
        .get("people")
        .and_then(Value::as_array)
        .and_then(|people| people.first())
    {
        return (
            string_at(person, &["name"]),
            string_at(person, &["person", "email"]),
        );
    }

    let name = prop.get("rich_text").and_then(join_plain_text);
    (name, None)
}

fn extract_flat(raw: &Value) -> Extracted {
    Extracted {
        id: string_at(raw, &["id"]),
        title: string_at(raw, &["title"]),
        status: string_at(raw, &["status"]),
        assignee_name: string_at(raw, &["assignee_name"]).or_else(|| string_at(raw, &["assignee"])),
        assignee_contact: string_at(raw, &["assignee_email"])
            .or_else(|| string_at(raw, &["assignee_contact"])),
        due_date: string_at(raw, &["due_date"]),
        priority: string_at(raw, &["priority"]),
        url: string_at(raw, &["url"]),
    }
}

/// Walk `path` through nested objects and return a non-empty string leaf.
fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Concatenate the `plain_text` of every rich-text segment in an array.
fn join_plain_text(segments: &Value) -> Option<String> {
    let joined: String = segments
        .as_array()?
        .iter()
        .filter_map(|segment| segment.get("plain_text").and_then(Value::as_str))
        .collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
