//! Status enums for Tasks and plugin Heartbeats.

use serde::{Deserialize, Serialize};

/// Status of a Task in the hub.
///
/// Transitions are strictly forward: `Queued` -> `Running` -> `Done` or
/// `Failed`. A task never moves backward and never revisits a state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task created but not yet picked up by a background worker.
    #[default]
    Queued,
    /// Task actively executing on a plugin.
    Running,
    /// Task completed successfully.
    Done,
    /// Task failed (routing, admission, abort, or execution error).
    Failed,
}

impl TaskStatus {
    /// Returns true if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the task is still active (not terminal).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// Status reported by a plugin heartbeat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatStatus {
    /// Plugin is loaded and not executing.
    #[default]
    Idle,
    /// Plugin is executing a command.
    Running,
    /// Plugin is in an error state; the watchdog raises an alert for this.
    Error,
}
