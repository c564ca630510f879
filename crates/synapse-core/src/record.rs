//! The task record - the durable lifecycle of one command.

use crate::{PluginId, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A TaskRecord tracks one submitted command from creation to completion.
///
/// Records are created by the fast path in `Queued` state and mutated only
/// by the orchestrator. A terminal record carries exactly one of
/// `result_message` / `error_message`, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique task identifier.
    pub id: TaskId,

    /// Full command text as submitted.
    pub command_text: String,

    /// Trigger token used for routing (or the `(default)` sentinel).
    pub trigger: String,

    /// Plugin that executed/is executing this task. Set exactly once, no
    /// later than the transition to `Running` on a successful dispatch.
    pub plugin_id: Option<PluginId>,

    /// Current task status.
    pub status: TaskStatus,

    /// When the task was created.
    pub created_at: DateTime<Utc>,

    /// When execution started (transition to `Running`).
    pub started_at: Option<DateTime<Utc>>,

    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,

    /// Result on success.
    pub result_message: Option<String>,

    /// Error description on failure.
    pub error_message: Option<String>,
}

impl TaskRecord {
    /// Create a new queued TaskRecord.
    pub fn new(command_text: impl Into<String>, trigger: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::generate(),
            command_text: command_text.into(),
            trigger: trigger.into(),
            plugin_id: None,
            status: TaskStatus::Queued,
            created_at: now,
            started_at: None,
            updated_at: now,
            result_message: None,
            error_message: None,
        }
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Mark the task as running.
    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
        let now = Utc::now();
        self.started_at = Some(now);
        self.updated_at = now;
    }

    /// Mark the task as done with a result.
    pub fn complete(&mut self, result: impl Into<String>) {
        self.status = TaskStatus::Done;
        self.result_message = Some(result.into());
        self.updated_at = Utc::now();
    }

    /// Mark the task as failed with an error description.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
