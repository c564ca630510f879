//! Plugin descriptors - the manifest data that registers a handler.

use crate::{CoreError, PluginId};
use serde::{Deserialize, Serialize};

/// Descriptor for one plugin, typically parsed from a `plugin.json`
/// manifest or declared in a compiled-in table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Unique plugin identifier.
    pub id: PluginId,

    /// Human-readable name.
    pub name: String,

    /// Plugin version string.
    pub version: String,

    /// Entry reference resolved against the loader's factory table.
    pub entry: String,

    /// Trigger tokens this plugin handles. Unique system-wide; on conflict
    /// the first-loaded registration wins.
    pub triggers: Vec<String>,

    /// Disabled plugins are skipped at load time.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl PluginDescriptor {
    /// Create a descriptor with the given identity and entry reference.
    pub fn new(
        id: impl Into<PluginId>,
        name: impl Into<String>,
        version: impl Into<String>,
        entry: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            entry: entry.into(),
            triggers: Vec::new(),
            enabled: true,
        }
    }

    /// Builder method to add a trigger.
    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.triggers.push(trigger.into());
        self
    }

    /// Builder method to set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Validate required fields.
    ///
    /// Every field the registry depends on must be present and non-empty;
    /// a descriptor with no triggers can never be routed to.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.id.as_str().is_empty() {
            return Err(CoreError::InvalidDescriptor("missing id".to_string()));
        }
        if self.name.is_empty() {
            return Err(CoreError::InvalidDescriptor("missing name".to_string()));
        }
        if self.version.is_empty() {
            return Err(CoreError::InvalidDescriptor("missing version".to_string()));
        }
        if self.entry.is_empty() {
            return Err(CoreError::InvalidDescriptor("missing entry".to_string()));
        }
        if self.triggers.is_empty() || self.triggers.iter().any(|t| t.is_empty()) {
            return Err(CoreError::InvalidDescriptor("missing triggers".to_string()));
        }
        Ok(())
    }
}
