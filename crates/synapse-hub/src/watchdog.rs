//! Watchdog - liveness monitor for the active plugin.
//!
//! One background loop, fixed interval, strictly observational: it reads
//! the orchestrator's advisory active-plugin id and polls that plugin's
//! heartbeat. An `Error` heartbeat raises a diagnostic alert. The loop
//! never mutates orchestrator state; stall detection with auto-abort is a
//! deliberate extension point left unimplemented.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use synapse_core::HeartbeatStatus;

use crate::orchestrator::Orchestrator;
use crate::registry::PluginRegistry;

/// Liveness monitor polling the active plugin's heartbeat.
pub struct Watchdog {
    orchestrator: Arc<Orchestrator>,
    registry: Arc<PluginRegistry>,
    interval: Duration,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Watchdog {
    /// Create a watchdog with the given poll interval.
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        registry: Arc<PluginRegistry>,
        interval_secs: u64,
    ) -> Self {
        Self {
            orchestrator,
            registry,
            interval: Duration::from_secs(interval_secs),
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    /// Start the monitor loop. Subsequent calls are no-ops.
    pub fn start(&self) {
        let mut handle = self.handle.lock().unwrap();
        if handle.is_some() {
            return;
        }

        let orchestrator = self.orchestrator.clone();
        let registry = self.registry.clone();
        let cancel = self.cancel.clone();
        let period = self.interval;

        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; skip it so a freshly
            // started watchdog does not poll before anything can run.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => tick(&orchestrator, &registry),
                }
            }
            debug!("Watchdog loop stopped");
        }));
        info!(interval_secs = period.as_secs(), "Watchdog started");
    }

    /// Stop the monitor loop with a bounded join.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            if tokio::time::timeout(Duration::from_secs(2), handle)
                .await
                .is_err()
            {
                warn!("Watchdog did not stop within 2s");
            }
        }
    }
}

/// One observation pass. No active plugin means nothing to do.
fn tick(orchestrator: &Orchestrator, registry: &PluginRegistry) {
    let Some(plugin_id) = orchestrator.active_plugin_id() else {
        return;
    };
    let Some(plugin) = registry.by_id(&plugin_id) else {
        // Stale advisory read; the execution may have just finished.
        return;
    };

    let heartbeat = plugin.heartbeat();
    if heartbeat.status == HeartbeatStatus::Error {
        warn!(
            plugin_id = %plugin_id,
            message = %heartbeat.message,
            "WATCHDOG ALERT: active plugin reported error"
        );
    } else {
        debug!(
            plugin_id = %plugin_id,
            status = ?heartbeat.status,
            progress = %heartbeat.progress,
            "Heartbeat"
        );
    }
}
