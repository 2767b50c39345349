//! Task records as delivered by the task store.
//!
//! The graph only reads tasks. Records are deserialized leniently (the id
//! is optional) so that a missing id surfaces as `MalformedInput` from the
//! builder rather than as an opaque parse failure.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Opaque identifier of a task, and therefore of its graph node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Known workflow stages of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(TaskStatus::Backlog),
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

/// An outgoing dependency edge declared by a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Stable edge id; synthesized from the endpoints when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The task this one depends on. May reference a task that is absent.
    pub to_id: String,
}

impl DependencyRecord {
    pub fn new(to_id: &str) -> Self {
        Self {
            id: None,
            to_id: to_id.to_string(),
        }
    }

    pub fn with_id(id: &str, to_id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            to_id: to_id.to_string(),
        }
    }

    /// The explicit edge id, if present and non-empty.
    pub fn explicit_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A task as read from the task store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaskRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub dependencies_out: Vec<DependencyRecord>,
}

impl TaskRecord {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            title: title.to_string(),
            status: None,
            dependencies_out: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    /// Add a dependency on `to_id` with a synthesized edge id.
    pub fn depends_on(mut self, to_id: &str) -> Self {
        self.dependencies_out.push(DependencyRecord::new(to_id));
        self
    }

    /// Add a dependency on `to_id` with an explicit edge id.
    pub fn depends_on_via(mut self, edge_id: &str, to_id: &str) -> Self {
        self.dependencies_out
            .push(DependencyRecord::with_id(edge_id, to_id));
        self
    }

    /// The task id if present and not blank.
    pub fn valid_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Status text if present and not blank.
    pub fn status_text(&self) -> Option<&str> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The status as a known stage, if it is one.
    pub fn status_kind(&self) -> Option<TaskStatus> {
        self.status_text().and_then(|s| s.parse().ok())
    }
}
