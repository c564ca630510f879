//! Core domain errors.

use thiserror::Error;

/// Core domain errors for Synapse.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Task not found.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Explicit command with no matching trigger.
    #[error("Unknown slash command/plugin.")]
    UnknownCommand,

    /// Admission rejected because another plugin holds the execution slot.
    #[error("System busy running {active}. Use /stop.")]
    Busy { active: String },

    /// No plugin resolved and the default plugin is missing too.
    #[error("Default plugin not found/loaded.")]
    NoDefaultPlugin,

    /// Descriptor failed validation.
    #[error("Invalid plugin descriptor: {0}")]
    InvalidDescriptor(String),

    /// Task store failure.
    #[error("Task store error: {0}")]
    Store(String),
}
