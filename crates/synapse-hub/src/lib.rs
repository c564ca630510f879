//! Synapse Hub Library
//!
//! This crate provides the orchestration core of Synapse: the plugin
//! registry, the single-flight orchestrator, the watchdog liveness
//! monitor, the task store seam, and the HTTP command API.

pub mod config;
pub mod http;
pub mod orchestrator;
pub mod plugins;
pub mod registry;
pub mod store;
pub mod watchdog;

pub use config::Config;
pub use orchestrator::Orchestrator;
pub use registry::{FactoryTable, PluginRegistry};
pub use store::{MemoryTaskStore, StoreError, TaskStore};
pub use watchdog::Watchdog;
