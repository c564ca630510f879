//! Orchestrator - admission control and dispatch.
//!
//! The orchestrator is the sole mutator of task records. It parses
//! commands, resolves a plugin by trigger, enforces single-flight
//! execution, and converts every plugin outcome into terminal record
//! state. Nothing from the background path propagates to a caller.

use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use synapse_core::{Command, CoreError, PluginId, TaskId, TaskRecord, TaskStatus, DEFAULT_TRIGGER};
use synapse_plugin::{ExecuteContext, PluginError};

use crate::registry::PluginRegistry;
use crate::store::TaskStore;

/// The single system-wide active execution, if any.
struct ActiveExecution {
    plugin_id: PluginId,
    cancel: CancellationToken,
}

/// Admission controller and dispatcher.
pub struct Orchestrator {
    registry: Arc<PluginRegistry>,
    store: Arc<dyn TaskStore>,
    default_plugin: PluginId,

    /// Single-flight execution slot: exactly one permit, acquired only in
    /// try mode. Admission control, not queueing.
    slot: Semaphore,

    /// Who holds the slot. Mutated only inside the slot's critical
    /// section; the watchdog's read is advisory and may be stale.
    active: Mutex<Option<ActiveExecution>>,
}

impl Orchestrator {
    /// Create an orchestrator over the given registry and store.
    pub fn new(
        registry: Arc<PluginRegistry>,
        store: Arc<dyn TaskStore>,
        default_plugin: PluginId,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            store,
            default_plugin,
            slot: Semaphore::new(1),
            active: Mutex::new(None),
        })
    }

    /// Create a task record for the given command text.
    ///
    /// Fast path: parses the trigger, persists a queued record, and
    /// returns. Never touches a plugin.
    pub async fn create_task(&self, text: &str) -> Result<TaskId, CoreError> {
        let command = Command::parse(text);
        let record = TaskRecord::new(text, command.trigger);
        let id = self
            .store
            .create(record)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))?;
        debug!(task_id = %id, "Task created");
        Ok(id)
    }

    /// Schedule `handle_command` in the background, fire-and-forget.
    pub fn spawn_handle(self: Arc<Self>, task_id: TaskId) {
        tokio::spawn(async move {
            self.handle_command(&task_id).await;
        });
    }

    /// Execute a task by id. Background path; never returns an error to
    /// the caller - every failure lands in the task record.
    pub async fn handle_command(&self, task_id: &TaskId) {
        let mut record = match self.store.get(task_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(task_id = %task_id, "No such task, ignoring");
                return;
            }
            Err(e) => {
                error!(task_id = %task_id, error = %e, "Failed to load task");
                return;
            }
        };

        // Re-delivery of an already-dispatched task is a no-op.
        if record.status != TaskStatus::Queued {
            debug!(task_id = %task_id, status = ?record.status, "Task already dispatched, ignoring");
            return;
        }

        record.start();
        self.persist(&record).await;

        // Re-derive trigger and payload from the stored text.
        let command = Command::parse(&record.command_text);
        let mut trigger = command.trigger;
        let mut payload = command.payload;

        let resolved = match self.registry.by_trigger(&trigger) {
            Some(resolved) => Some(resolved),
            None => {
                if Command::is_explicit(&record.command_text) {
                    // Explicit command with no matching trigger never
                    // falls back to the default plugin.
                    record.fail(CoreError::UnknownCommand.to_string());
                    self.persist(&record).await;
                    return;
                }
                trigger = DEFAULT_TRIGGER.to_string();
                payload = record.command_text.clone();
                self.registry
                    .by_id(&self.default_plugin)
                    .map(|plugin| (self.default_plugin.clone(), plugin))
            }
        };

        let (plugin_id, plugin) = match resolved {
            Some(resolved) => resolved,
            None => {
                record.fail(CoreError::NoDefaultPlugin.to_string());
                self.persist(&record).await;
                return;
            }
        };

        // Single-flight admission: non-blocking, immediate rejection.
        let permit = match self.slot.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                let active = self
                    .active_plugin_id()
                    .map(|id| id.into_inner())
                    .unwrap_or_else(|| "unknown".to_string());
                warn!(task_id = %task_id, active = %active, "Admission rejected, system busy");
                record.fail(CoreError::Busy { active }.to_string());
                self.persist(&record).await;
                return;
            }
        };

        let cancel = CancellationToken::new();
        *self.active.lock().unwrap() = Some(ActiveExecution {
            plugin_id: plugin_id.clone(),
            cancel: cancel.clone(),
        });

        record.plugin_id = Some(plugin_id.clone());
        self.persist(&record).await;

        info!(task_id = %task_id, plugin_id = %plugin_id, trigger = %trigger, "Dispatching task");

        let ctx = ExecuteContext::new(trigger, cancel.child_token());

        // Run the plugin on its own task so a panicking handler cannot
        // take the execution slot down with it.
        let handle = tokio::spawn(async move { plugin.execute(&payload, ctx).await });
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(PluginError::Failed(format!("Plugin execution panicked: {e}"))),
        };

        match outcome {
            Ok(result) => {
                info!(task_id = %task_id, plugin_id = %plugin_id, "Task done");
                record.complete(result);
            }
            Err(e) if e.is_aborted() => {
                info!(task_id = %task_id, plugin_id = %plugin_id, "Task aborted by user");
                record.fail("User Aborted");
            }
            Err(e) => {
                warn!(task_id = %task_id, plugin_id = %plugin_id, error = %e, "Task failed");
                record.fail(e.to_string());
            }
        }

        // Release path: clear the active execution before the permit so no
        // observer sees a stale holder after the slot reopens.
        *self.active.lock().unwrap() = None;
        drop(permit);
        self.persist(&record).await;
    }

    /// Cooperative global stop.
    ///
    /// Cancels the active execution's token; the running plugin observes
    /// it at its next poll. No forced kill exists.
    pub fn abort_active_task(&self) -> String {
        let guard = self.active.lock().unwrap();
        match guard.as_ref() {
            None => "No active task to stop.".to_string(),
            Some(active) => {
                active.cancel.cancel();
                format!("Stop signal sent to {}...", active.plugin_id)
            }
        }
    }

    /// Advisory read of the currently active plugin, used by the watchdog.
    pub fn active_plugin_id(&self) -> Option<PluginId> {
        self.active
            .lock()
            .unwrap()
            .as_ref()
            .map(|active| active.plugin_id.clone())
    }

    /// Fetch the current record for a task, for status queries.
    pub async fn task_status(&self, task_id: &TaskId) -> Result<Option<TaskRecord>, CoreError> {
        self.store
            .get(task_id)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))
    }

    async fn persist(&self, record: &TaskRecord) {
        if let Err(e) = self.store.update(record).await {
            error!(task_id = %record.id, error = %e, "Failed to persist task record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use synapse_core::PluginDescriptor;
    use synapse_plugin::{Heartbeat, Plugin, PluginConfig, PluginError};

    use crate::config::Config;
    use crate::registry::{FactoryTable, PluginRegistry};
    use crate::store::MemoryTaskStore;

    /// Plugin that answers immediately with a fixed response.
    struct FixedPlugin {
        response: String,
        calls: Arc<AtomicUsize>,
        seen_trigger: Arc<Mutex<Option<String>>>,
        seen_payload: Arc<Mutex<Option<String>>>,
    }

    #[async_trait]
    impl Plugin for FixedPlugin {
        async fn on_load(&self) -> Result<(), PluginError> {
            Ok(())
        }

        async fn execute(&self, command: &str, ctx: ExecuteContext) -> Result<String, PluginError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_trigger.lock().unwrap() = Some(ctx.trigger.clone());
            *self.seen_payload.lock().unwrap() = Some(command.to_string());
            Ok(self.response.clone())
        }

        fn is_busy(&self) -> bool {
            false
        }

        fn heartbeat(&self) -> Heartbeat {
            Heartbeat::idle("fixed")
        }

        async fn shutdown(&self) {}
    }

    /// Plugin that blocks until released, honoring cancellation.
    struct BlockingPlugin {
        started: Arc<Notify>,
        release: Arc<Notify>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Plugin for BlockingPlugin {
        async fn on_load(&self) -> Result<(), PluginError> {
            Ok(())
        }

        async fn execute(
            &self,
            _command: &str,
            ctx: ExecuteContext,
        ) -> Result<String, PluginError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            tokio::select! {
                _ = ctx.cancel.cancelled() => Err(PluginError::Aborted),
                _ = self.release.notified() => Ok("released".to_string()),
            }
        }

        fn is_busy(&self) -> bool {
            false
        }

        fn heartbeat(&self) -> Heartbeat {
            Heartbeat::running("N/A", "blocking")
        }

        async fn shutdown(&self) {}
    }

    struct Harness {
        orchestrator: Arc<Orchestrator>,
        registry: Arc<PluginRegistry>,
        store: Arc<MemoryTaskStore>,
        p1_calls: Arc<AtomicUsize>,
        p1_trigger: Arc<Mutex<Option<String>>>,
        p1_payload: Arc<Mutex<Option<String>>>,
        default_calls: Arc<AtomicUsize>,
        default_trigger: Arc<Mutex<Option<String>>>,
        default_payload: Arc<Mutex<Option<String>>>,
        block_started: Arc<Notify>,
        block_release: Arc<Notify>,
        block_calls: Arc<AtomicUsize>,
    }

    /// Registry with: /echo -> "hi back", /block -> blocking plugin,
    /// default "system" plugin -> "handled".
    async fn harness() -> Harness {
        let p1_calls = Arc::new(AtomicUsize::new(0));
        let p1_trigger = Arc::new(Mutex::new(None));
        let p1_payload = Arc::new(Mutex::new(None));
        let default_calls = Arc::new(AtomicUsize::new(0));
        let default_trigger = Arc::new(Mutex::new(None));
        let default_payload = Arc::new(Mutex::new(None));
        let block_started = Arc::new(Notify::new());
        let block_release = Arc::new(Notify::new());
        let block_calls = Arc::new(AtomicUsize::new(0));

        let mut factories = FactoryTable::new();
        {
            let calls = p1_calls.clone();
            let trigger = p1_trigger.clone();
            let payload = p1_payload.clone();
            factories.register("test.echo", move |_config: PluginConfig| {
                Arc::new(FixedPlugin {
                    response: "hi back".to_string(),
                    calls: calls.clone(),
                    seen_trigger: trigger.clone(),
                    seen_payload: payload.clone(),
                }) as Arc<dyn Plugin>
            });
        }
        {
            let calls = default_calls.clone();
            let trigger = default_trigger.clone();
            let payload = default_payload.clone();
            factories.register("test.system", move |_config: PluginConfig| {
                Arc::new(FixedPlugin {
                    response: "handled".to_string(),
                    calls: calls.clone(),
                    seen_trigger: trigger.clone(),
                    seen_payload: payload.clone(),
                }) as Arc<dyn Plugin>
            });
        }
        {
            let started = block_started.clone();
            let release = block_release.clone();
            let calls = block_calls.clone();
            factories.register("test.block", move |_config: PluginConfig| {
                Arc::new(BlockingPlugin {
                    started: started.clone(),
                    release: release.clone(),
                    calls: calls.clone(),
                }) as Arc<dyn Plugin>
            });
        }

        let descriptors = vec![
            PluginDescriptor::new("echo", "Echo", "1.0.0", "test.echo").with_trigger("/echo"),
            PluginDescriptor::new("block", "Block", "1.0.0", "test.block").with_trigger("/block"),
            PluginDescriptor::new("system", "System", "1.0.0", "test.system").with_trigger("/sys"),
        ];

        let registry =
            Arc::new(PluginRegistry::load(descriptors, &factories, &Config::default()).await);
        let store = Arc::new(MemoryTaskStore::new());
        let orchestrator =
            Orchestrator::new(registry.clone(), store.clone(), PluginId::new("system"));

        Harness {
            orchestrator,
            registry,
            store,
            p1_calls,
            p1_trigger,
            p1_payload,
            default_calls,
            default_trigger,
            default_payload,
            block_started,
            block_release,
            block_calls,
        }
    }

    async fn run_to_completion(h: &Harness, text: &str) -> TaskRecord {
        let id = h.orchestrator.create_task(text).await.unwrap();
        h.orchestrator.handle_command(&id).await;
        h.store.get(&id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_create_task_is_queued() {
        let h = harness().await;
        let id = h.orchestrator.create_task("/echo hi").await.unwrap();
        let record = h.store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, TaskStatus::Queued);
        assert_eq!(record.trigger, "/echo");
        assert_eq!(record.command_text, "/echo hi");
        assert!(record.plugin_id.is_none());
        assert_eq!(h.p1_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_echo_scenario_done() {
        let h = harness().await;
        let record = run_to_completion(&h, "/echo hi").await;

        assert_eq!(record.status, TaskStatus::Done);
        assert_eq!(record.result_message.as_deref(), Some("hi back"));
        assert!(record.error_message.is_none());
        assert_eq!(record.plugin_id.as_ref().unwrap().as_str(), "echo");
        assert!(record.started_at.is_some());
        assert_eq!(h.p1_payload.lock().unwrap().as_deref(), Some("hi"));
        assert_eq!(h.p1_trigger.lock().unwrap().as_deref(), Some("/echo"));
    }

    #[tokio::test]
    async fn test_free_text_falls_back_to_default() {
        let h = harness().await;
        let record = run_to_completion(&h, "ambiguous text").await;

        assert_eq!(record.status, TaskStatus::Done);
        assert_eq!(record.result_message.as_deref(), Some("handled"));
        assert_eq!(record.plugin_id.as_ref().unwrap().as_str(), "system");
        // Full text as payload, sentinel trigger.
        assert_eq!(
            h.default_payload.lock().unwrap().as_deref(),
            Some("ambiguous text")
        );
        assert_eq!(
            h.default_trigger.lock().unwrap().as_deref(),
            Some(DEFAULT_TRIGGER)
        );
        assert_eq!(h.p1_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_explicit_command_never_defaults() {
        let h = harness().await;
        let record = run_to_completion(&h, "/z something").await;

        assert_eq!(record.status, TaskStatus::Failed);
        assert!(record
            .error_message
            .as_deref()
            .unwrap()
            .contains("Unknown slash command"));
        assert!(record.result_message.is_none());
        assert!(record.plugin_id.is_none());
        assert_eq!(h.default_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_default_plugin_fails() {
        let h = harness().await;
        // Point the orchestrator at a default that was never loaded.
        let orchestrator = Orchestrator::new(
            h.registry.clone(),
            h.store.clone(),
            PluginId::new("ghost"),
        );
        let id = orchestrator.create_task("free text").await.unwrap();
        orchestrator.handle_command(&id).await;

        let record = h.store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, TaskStatus::Failed);
        assert!(record
            .error_message
            .as_deref()
            .unwrap()
            .contains("Default plugin not found"));
    }

    #[tokio::test]
    async fn test_handle_missing_task_is_noop() {
        let h = harness().await;
        h.orchestrator.handle_command(&TaskId::new("no-such")).await;
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_handle_terminal_task_is_noop() {
        let h = harness().await;
        let record = run_to_completion(&h, "/echo hi").await;
        assert_eq!(record.status, TaskStatus::Done);
        assert_eq!(h.p1_calls.load(Ordering::SeqCst), 1);

        // Re-delivery must not re-execute or rewrite the record.
        h.orchestrator.handle_command(&record.id).await;
        let after = h.store.get(&record.id).await.unwrap().unwrap();
        assert_eq!(after, record);
        assert_eq!(h.p1_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_dispatch_one_admitted() {
        let h = harness().await;

        let blocked_id = h.orchestrator.create_task("/block work").await.unwrap();
        h.orchestrator.clone().spawn_handle(blocked_id.clone());
        h.block_started.notified().await;

        // Second dispatch while the slot is held fails admission without
        // ever invoking its plugin.
        let rejected = run_to_completion(&h, "/echo hi").await;
        assert_eq!(rejected.status, TaskStatus::Failed);
        assert!(rejected
            .error_message
            .as_deref()
            .unwrap()
            .contains("System busy running block"));
        assert_eq!(h.p1_calls.load(Ordering::SeqCst), 0);
        assert!(rejected.plugin_id.is_none());

        // Release the first task and let it finish.
        h.block_release.notify_one();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let record = h.store.get(&blocked_id).await.unwrap().unwrap();
            if record.is_terminal() {
                assert_eq!(record.status, TaskStatus::Done);
                assert_eq!(record.result_message.as_deref(), Some("released"));
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "task never finished");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(h.orchestrator.active_plugin_id().is_none());
    }

    #[tokio::test]
    async fn test_slot_reopens_after_completion() {
        let h = harness().await;
        let first = run_to_completion(&h, "/echo one").await;
        assert_eq!(first.status, TaskStatus::Done);
        let second = run_to_completion(&h, "/echo two").await;
        assert_eq!(second.status, TaskStatus::Done);
        assert_eq!(h.p1_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_abort_idle_is_noop() {
        let h = harness().await;
        let message = h.orchestrator.abort_active_task();
        assert_eq!(message, "No active task to stop.");
        assert!(h.orchestrator.active_plugin_id().is_none());
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_abort_busy_cancels_active_plugin() {
        let h = harness().await;

        let id = h.orchestrator.create_task("/block work").await.unwrap();
        h.orchestrator.clone().spawn_handle(id.clone());
        h.block_started.notified().await;

        assert_eq!(
            h.orchestrator.active_plugin_id().unwrap().as_str(),
            "block"
        );
        let message = h.orchestrator.abort_active_task();
        assert!(message.contains("block"));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let record = h.store.get(&id).await.unwrap().unwrap();
            if record.is_terminal() {
                assert_eq!(record.status, TaskStatus::Failed);
                assert_eq!(record.error_message.as_deref(), Some("User Aborted"));
                assert!(record.result_message.is_none());
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "abort never landed");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(h.orchestrator.active_plugin_id().is_none());
        assert_eq!(h.block_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_status_sequence_forward_only() {
        let h = harness().await;
        let id = h.orchestrator.create_task("/echo hi").await.unwrap();

        let queued = h.store.get(&id).await.unwrap().unwrap();
        assert_eq!(queued.status, TaskStatus::Queued);

        h.orchestrator.handle_command(&id).await;
        let done = h.store.get(&id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        assert!(done.started_at.is_some());
        assert!(done.updated_at >= done.created_at);
        // Exactly one of result/error on a terminal record.
        assert!(done.result_message.is_some() ^ done.error_message.is_some());
    }

    #[tokio::test]
    async fn test_task_status_query() {
        let h = harness().await;
        let id = h.orchestrator.create_task("/echo hi").await.unwrap();
        let record = h.orchestrator.task_status(&id).await.unwrap().unwrap();
        assert_eq!(record.status, TaskStatus::Queued);
        let missing = h
            .orchestrator
            .task_status(&TaskId::new("missing"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
