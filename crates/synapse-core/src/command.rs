//! Command text parsing.
//!
//! A command is routed by its leading whitespace-separated token (the
//! trigger); the remainder is the payload handed to the plugin. Text that
//! starts with `/` is an explicit command and never falls back to the
//! default plugin when its trigger is unknown.

/// Sentinel trigger recorded when a task is routed to the default plugin.
pub const DEFAULT_TRIGGER: &str = "(default)";

/// Marker prefix that makes a command explicit.
pub const COMMAND_MARKER: char = '/';

/// A command split into trigger and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Leading token, used for routing.
    pub trigger: String,

    /// Everything after the trigger, without the separating whitespace.
    pub payload: String,
}

impl Command {
    /// Split command text into trigger and payload.
    ///
    /// The trigger is the first whitespace-separated token; the payload is
    /// the rest (empty when the text is a bare trigger).
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed.split_once(char::is_whitespace) {
            Some((trigger, rest)) => Self {
                trigger: trigger.to_string(),
                payload: rest.trim_start().to_string(),
            },
            None => Self {
                trigger: trimmed.to_string(),
                payload: String::new(),
            },
        }
    }

    /// Returns true if the text carries the explicit-command marker.
    pub fn is_explicit(text: &str) -> bool {
        text.trim_start().starts_with(COMMAND_MARKER)
    }
}
