//! Plugin registry - discovery, validation, and lookup.
//!
//! Descriptors come from a compiled-in table and optionally from
//! `plugin.json` manifests on disk. Instantiation goes through a
//! [`FactoryTable`] keyed by the descriptor's entry reference, so the
//! registry never depends on how a plugin is built.
//!
//! Every load failure is isolated: a bad manifest, an unknown entry, or a
//! failing `on_load` drops that plugin with a diagnostic and never aborts
//! loading of the others.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use synapse_core::{PluginDescriptor, PluginId};
use synapse_plugin::{Plugin, PluginConfig};

use crate::config::Config;

/// Constructor for one plugin kind. Receives the plugin's opaque config.
pub type PluginFactory = Arc<dyn Fn(PluginConfig) -> Arc<dyn Plugin> + Send + Sync>;

/// Compiled-in table of plugin constructors keyed by entry reference.
#[derive(Default)]
pub struct FactoryTable {
    factories: HashMap<String, PluginFactory>,
}

impl FactoryTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under an entry reference.
    pub fn register<F>(&mut self, entry: impl Into<String>, factory: F)
    where
        F: Fn(PluginConfig) -> Arc<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(entry.into(), Arc::new(factory));
    }

    fn get(&self, entry: &str) -> Option<&PluginFactory> {
        self.factories.get(entry)
    }
}

/// Registry of loaded plugin instances.
///
/// Owns every instance for the process lifetime; the orchestrator and the
/// watchdog hold references, never ownership.
pub struct PluginRegistry {
    plugins: HashMap<PluginId, Arc<dyn Plugin>>,
    triggers: HashMap<String, PluginId>,
    descriptors: Vec<PluginDescriptor>,
}

impl PluginRegistry {
    /// Load plugins from descriptors using the given factory table.
    pub async fn load(
        descriptors: Vec<PluginDescriptor>,
        factories: &FactoryTable,
        config: &Config,
    ) -> Self {
        let mut registry = Self {
            plugins: HashMap::new(),
            triggers: HashMap::new(),
            descriptors: Vec::new(),
        };

        for descriptor in descriptors {
            registry.load_one(descriptor, factories, config).await;
        }

        info!(
            plugins = registry.plugins.len(),
            triggers = registry.triggers.len(),
            "Plugin registry loaded"
        );
        registry
    }

    async fn load_one(
        &mut self,
        descriptor: PluginDescriptor,
        factories: &FactoryTable,
        config: &Config,
    ) {
        if let Err(e) = descriptor.validate() {
            warn!(plugin_id = %descriptor.id, error = %e, "Skipping plugin: invalid descriptor");
            return;
        }

        if !descriptor.enabled || !config.plugin_enabled(&descriptor.id) {
            info!(plugin_id = %descriptor.id, "Plugin disabled, skipping");
            return;
        }

        if self.plugins.contains_key(&descriptor.id) {
            warn!(plugin_id = %descriptor.id, "Duplicate plugin id, keeping first registration");
            return;
        }

        let factory = match factories.get(&descriptor.entry) {
            Some(f) => f,
            None => {
                warn!(
                    plugin_id = %descriptor.id,
                    entry = %descriptor.entry,
                    "Skipping plugin: unresolved entry reference"
                );
                return;
            }
        };

        let instance = factory(config.plugin_config(&descriptor.id));

        if let Err(e) = instance.on_load().await {
            warn!(plugin_id = %descriptor.id, error = %e, "Plugin on_load failed, skipping");
            return;
        }

        for trigger in &descriptor.triggers {
            if let Some(existing) = self.triggers.get(trigger) {
                warn!(
                    trigger = %trigger,
                    plugin_id = %descriptor.id,
                    registered_to = %existing,
                    "Trigger conflict, keeping first registration"
                );
            } else {
                self.triggers
                    .insert(trigger.clone(), descriptor.id.clone());
            }
        }

        info!(
            plugin_id = %descriptor.id,
            name = %descriptor.name,
            version = %descriptor.version,
            "Loaded plugin"
        );
        self.plugins.insert(descriptor.id.clone(), instance);
        self.descriptors.push(descriptor);
    }

    /// Resolve a plugin by exact trigger match.
    pub fn by_trigger(&self, trigger: &str) -> Option<(PluginId, Arc<dyn Plugin>)> {
        let id = self.triggers.get(trigger)?;
        let plugin = self.plugins.get(id)?;
        Some((id.clone(), plugin.clone()))
    }

    /// Resolve a plugin by id.
    pub fn by_id(&self, id: &PluginId) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(id).cloned()
    }

    /// Descriptors of every loaded plugin.
    pub fn descriptors(&self) -> &[PluginDescriptor] {
        &self.descriptors
    }

    /// Shut down every instance. A panicking shutdown is logged, never
    /// propagated.
    pub async fn shutdown_all(&self) {
        for (id, plugin) in &self.plugins {
            let plugin = plugin.clone();
            let handle = tokio::spawn(async move { plugin.shutdown().await });
            if let Err(e) = handle.await {
                warn!(plugin_id = %id, error = %e, "Plugin shutdown failed");
            }
        }
    }
}

/// Scan a directory for `<dir>/*/plugin.json` manifests.
///
/// Parse failures are isolated per manifest. A missing directory yields an
/// empty list with a diagnostic.
pub fn load_manifests(dir: impl AsRef<Path>) -> Vec<PluginDescriptor> {
    let dir = dir.as_ref();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Plugin directory not readable");
            return Vec::new();
        }
    };

    let mut descriptors = Vec::new();
    for entry in entries.flatten() {
        let manifest_path = entry.path().join("plugin.json");
        if !manifest_path.is_file() {
            continue;
        }
        let parsed = std::fs::read_to_string(&manifest_path)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                serde_json::from_str::<PluginDescriptor>(&text).map_err(|e| e.to_string())
            });
        match parsed {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(e) => {
                warn!(manifest = %manifest_path.display(), error = %e, "Skipping bad manifest");
            }
        }
    }
    descriptors
}
