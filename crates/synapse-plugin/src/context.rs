//! Execution context handed to a plugin.

use tokio_util::sync::CancellationToken;

/// Context for one `execute` call.
///
/// The cancellation token is the cooperative stop flag: the orchestrator
/// keeps the parent token and cancels it when the user aborts the active
/// task. There is no forced termination; a plugin that never checks the
/// token cannot be reclaimed.
#[derive(Debug, Clone)]
pub struct ExecuteContext {
    /// Trigger that routed this command (or the `(default)` sentinel).
    pub trigger: String,

    /// Cooperative cancellation flag, polled by the plugin.
    pub cancel: CancellationToken,
}

impl ExecuteContext {
    /// Create a context for the given trigger and token.
    pub fn new(trigger: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            trigger: trigger.into(),
            cancel,
        }
    }

    /// Returns true if a stop has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
