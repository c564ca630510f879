//! Echo plugin - answers with its payload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use synapse_plugin::{ExecuteContext, Heartbeat, Plugin, PluginConfig, PluginError};

/// Trivial plugin that echoes the command back. Useful as an end-to-end
/// smoke test of routing, admission, and the result path.
#[derive(Default)]
pub struct EchoPlugin {
    busy: AtomicBool,
}

impl EchoPlugin {
    /// Factory entry point.
    pub fn create(_config: PluginConfig) -> Arc<dyn Plugin> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Plugin for EchoPlugin {
    async fn on_load(&self) -> Result<(), PluginError> {
        Ok(())
    }

    async fn execute(&self, command: &str, ctx: ExecuteContext) -> Result<String, PluginError> {
        self.busy.store(true, Ordering::SeqCst);
        let result = if ctx.is_cancelled() {
            Err(PluginError::Aborted)
        } else {
            Ok(format!("Echo: {}", command))
        };
        self.busy.store(false, Ordering::SeqCst);
        result
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn heartbeat(&self) -> Heartbeat {
        if self.is_busy() {
            Heartbeat::running("N/A", "Echoing")
        } else {
            Heartbeat::idle("Echo ready")
        }
    }

    async fn shutdown(&self) {}
}
