//! Plugin error taxonomy.

use thiserror::Error;

/// Errors a plugin can surface to the hub.
///
/// `Aborted` is distinguished from generic failure so the orchestrator can
/// record a cooperative abort as "User Aborted" rather than an error
/// description.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Execution stopped cooperatively after a cancellation request.
    #[error("Plugin execution aborted by user.")]
    Aborted,

    /// `on_load` failed; the plugin's registration is dropped.
    #[error("Plugin initialization failed: {0}")]
    Init(String),

    /// A capability is disabled by plugin configuration.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Generic execution failure.
    #[error("{0}")]
    Failed(String),
}

impl PluginError {
    /// Returns true for the cooperative-abort outcome.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}
