//! Heartbeat snapshots for liveness monitoring.

use serde::{Deserialize, Serialize};
use synapse_core::HeartbeatStatus;

/// Lightweight status snapshot polled by the watchdog.
///
/// Producing one must be non-blocking with bounded latency; the watchdog
/// calls it from a separate task while `execute` may be running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Coarse plugin state.
    pub status: HeartbeatStatus,

    /// Free-form progress indicator (e.g. "3/10", "N/A").
    pub progress: String,

    /// Human-readable status message.
    pub message: String,
}

impl Heartbeat {
    /// An idle heartbeat with the given message.
    pub fn idle(message: impl Into<String>) -> Self {
        Self {
            status: HeartbeatStatus::Idle,
            progress: "N/A".to_string(),
            message: message.into(),
        }
    }

    /// A running heartbeat with progress and message.
    pub fn running(progress: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: HeartbeatStatus::Running,
            progress: progress.into(),
            message: message.into(),
        }
    }

    /// An error heartbeat; the watchdog raises an alert when it sees one.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: HeartbeatStatus::Error,
            progress: "N/A".to_string(),
            message: message.into(),
        }
    }
}
