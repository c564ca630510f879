//! Synapse Plugin Capability Contract
//!
//! Every automation handler implements [`Plugin`]. The hub treats handlers
//! uniformly through this trait: it never interprets a plugin's result
//! string or looks past the capability set defined here.
//!
//! Concurrency contract: `execute` and `heartbeat` run concurrently for
//! the same instance (the watchdog polls heartbeats from its own task
//! while `execute` is in flight), so implementations own the thread-safety
//! of any state shared between them.

pub mod context;
pub mod error;
pub mod heartbeat;

pub use context::ExecuteContext;
pub use error::PluginError;
pub use heartbeat::Heartbeat;

use async_trait::async_trait;

/// Opaque per-plugin configuration, passed through from the hub config.
pub type PluginConfig = serde_json::Map<String, serde_json::Value>;

/// Capability contract every automation handler implements.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// One-time initialization at registry load time.
    ///
    /// A failure here aborts only this plugin's registration; other
    /// plugins keep loading.
    async fn on_load(&self) -> Result<(), PluginError>;

    /// Execute a command. Blocks (is awaited) for the full duration.
    ///
    /// Implementations must poll `ctx.cancel` periodically and return
    /// [`PluginError::Aborted`] promptly once cancellation is requested.
    /// The returned string is opaque to the hub.
    async fn execute(&self, command: &str, ctx: ExecuteContext) -> Result<String, PluginError>;

    /// Non-blocking, best-effort busy indicator.
    fn is_busy(&self) -> bool;

    /// Non-blocking liveness snapshot, safe to call while `execute` runs.
    fn heartbeat(&self) -> Heartbeat;

    /// Release resources at process teardown.
    async fn shutdown(&self);
}
