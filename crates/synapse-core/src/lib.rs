//! Synapse Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Database
//! - Runtime specifics
//!
//! All types here represent the core business domain of Synapse.

pub mod command;
pub mod descriptor;
pub mod error;
pub mod ids;
pub mod record;
pub mod status;

// Re-export commonly used types
pub use command::{Command, DEFAULT_TRIGGER};
pub use descriptor::PluginDescriptor;
pub use error::CoreError;
pub use ids::{PluginId, TaskId};
pub use record::TaskRecord;
pub use status::{HeartbeatStatus, TaskStatus};
