//! System control plugin - the default free-text target.
//!
//! Handles `run <cmd>` / `exec <cmd>` by spawning a shell, gated by the
//! `allow_terminal` flag in its plugin config. Anything else is echoed
//! back, which is what free text routed here falls through to.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use synapse_plugin::{ExecuteContext, Heartbeat, Plugin, PluginConfig, PluginError};

/// Default plugin for system-level commands and unrouted free text.
pub struct SystemPlugin {
    allow_terminal: bool,
    busy: AtomicBool,
}

impl SystemPlugin {
    /// Factory entry point.
    pub fn create(config: PluginConfig) -> Arc<dyn Plugin> {
        let allow_terminal = config
            .get("allow_terminal")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Arc::new(Self {
            allow_terminal,
            busy: AtomicBool::new(false),
        })
    }

    async fn run(&self, command: &str, ctx: &ExecuteContext) -> Result<String, PluginError> {
        if ctx.is_cancelled() {
            return Err(PluginError::Aborted);
        }

        let trimmed = command.trim();
        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();

        if verb.eq_ignore_ascii_case("run") || verb.eq_ignore_ascii_case("exec") {
            if rest.is_empty() {
                return Ok("Usage: run <cmd>".to_string());
            }
            return self.run_terminal(rest, ctx).await;
        }

        Ok(format!("Echo: {}", command))
    }

    async fn run_terminal(&self, cmd: &str, ctx: &ExecuteContext) -> Result<String, PluginError> {
        if !self.allow_terminal {
            return Err(PluginError::PermissionDenied(
                "Terminal access disabled for System plugin.".to_string(),
            ));
        }

        let child = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PluginError::Failed(format!("Failed to spawn command: {}", e)))?;

        // kill_on_drop reaps the child when the cancelled branch wins.
        let output = tokio::select! {
            _ = ctx.cancel.cancelled() => return Err(PluginError::Aborted),
            output = child.wait_with_output() => {
                output.map_err(|e| PluginError::Failed(format!("Command failed: {}", e)))?
            }
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(PluginError::Failed(format!(
                "Error: {}",
                String::from_utf8_lossy(&output.stderr)
            )))
        }
    }
}

#[async_trait]
impl Plugin for SystemPlugin {
    async fn on_load(&self) -> Result<(), PluginError> {
        Ok(())
    }

    async fn execute(&self, command: &str, ctx: ExecuteContext) -> Result<String, PluginError> {
        self.busy.store(true, Ordering::SeqCst);
        let result = self.run(command, &ctx).await;
        self.busy.store(false, Ordering::SeqCst);
        result
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn heartbeat(&self) -> Heartbeat {
        if self.is_busy() {
            Heartbeat::running("N/A", "Executing")
        } else {
            Heartbeat::idle("System Ready")
        }
    }

    async fn shutdown(&self) {}
}
