//! Canonical task model shared by the whole pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Title used when the provider record carries none.
pub const UNTITLED: &str = "Untitled";
/// Assignee name used when the provider record carries none.
pub const UNASSIGNED: &str = "Unassigned";
/// Priority used when the provider record carries none.
pub const DEFAULT_PRIORITY: &str = "Medium";

/// Normalized workflow status of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet.
    ToDo,
    /// Currently being worked on.
    InProgress,
    /// Finished.
    Done,
    /// Label not present in the status table.
    Unknown,
}

impl TaskStatus {
    /// Map a free-text provider label onto a status.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Labels outside the fixed table map to [`TaskStatus::Unknown`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "to do" | "todo" | "not started" | "backlog" => Self::ToDo,
            "in progress" | "in-progress" | "doing" | "in review" => Self::InProgress,
            "done" | "completed" | "complete" => Self::Done,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label used in reports and API payloads.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the task still counts toward someone's workload.
    #[must_use]
    pub fn is_active(self) -> bool {
        self != Self::Done
    }
}

/// Provider-agnostic task record.
///
/// Constructed once by the normalizer and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    /// Provider record identifier, when known.
    pub id: Option<String>,
    /// Task title; never empty.
    pub title: String,
    /// Normalized status.
    pub status: TaskStatus,
    /// Display name of the assignee.
    pub assignee_name: String,
    /// Address used to route notifications to the assignee.
    pub assignee_contact: Option<String>,
    /// Due date, absent when the provider had none or it failed to parse.
    pub due_date: Option<NaiveDate>,
    /// Free-text priority label.
    pub priority: String,
    /// Deep link back to the originating record.
    pub source_url: Option<String>,
}

impl Task {
    /// Build a task with defaults for every optional attribute.
    ///
    /// An empty or whitespace-only title falls back to [`UNTITLED`].
    #[must_use]
    pub fn new(title: impl Into<String>, status: TaskStatus) -> Self {
        let title = title.into();
        Self {
            id: None,
            title: if title.trim().is_empty() {
                UNTITLED.to_owned()
            } else {
                title
            },
            status,
            assignee_name: UNASSIGNED.to_owned(),
            assignee_contact: None,
            due_date: None,
            priority: DEFAULT_PRIORITY.to_owned(),
            source_url: None,
        }
    }

    /// Set the assignee name and optional contact.
    #[must_use]
    pub fn with_assignee(mut self, name: impl Into<String>, contact: Option<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.assignee_name = name;
        }
        self.assignee_contact = contact.filter(|c| !c.trim().is_empty());
        self
    }

    /// Set the due date.
    #[must_use]
    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    /// Set the priority label; blank labels keep the default.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        let priority = priority.into();
        if !priority.trim().is_empty() {
            self.priority = priority;
        }
        self
    }

    /// Set the provider identifier.
    #[must_use]
    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    /// Set the deep link back to the provider.
    #[must_use]
    pub fn with_source_url(mut self, url: Option<String>) -> Self {
        self.source_url = url;
        self
    }
}
