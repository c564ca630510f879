//! Built-in plugins shipped with the hub binary.
//!
//! External handlers register through the same descriptor/factory
//! mechanism; these two exist so a fresh install has a routable default
//! plugin and a smoke-test target.

pub mod echo;
pub mod system;

use synapse_core::PluginDescriptor;

use crate::registry::FactoryTable;

pub use echo::EchoPlugin;
pub use system::SystemPlugin;

/// Factory table with the built-in plugin constructors.
pub fn builtin_factories() -> FactoryTable {
    let mut factories = FactoryTable::new();
    factories.register("builtin.echo", |config| EchoPlugin::create(config));
    factories.register("builtin.system", |config| SystemPlugin::create(config));
    factories
}

/// Descriptors for the built-in plugins.
pub fn builtin_descriptors() -> Vec<PluginDescriptor> {
    vec![
        PluginDescriptor::new("echo", "Echo", "0.1.0", "builtin.echo").with_trigger("/echo"),
        PluginDescriptor::new("system", "System Control", "0.1.0", "builtin.system")
            .with_trigger("/sys")
            .with_trigger("/sysctl"),
    ]
}
