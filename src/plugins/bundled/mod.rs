//! Plugins compiled into the binary

pub mod bot_core;
pub mod custom_commands;
pub mod reminders;

use std::sync::Arc;

use crate::infrastructure::plugins::{PluginManifest, PluginRegistry};
use crate::plugins::Plugin;

pub use bot_core::CorePlugin;
pub use custom_commands::CustomCommandsPlugin;
pub use reminders::RemindersPlugin;

/// Register the bundled plugin modules
pub fn register_bundled(registry: &mut PluginRegistry) {
    registry.register(bot_core::MODULE, |_m: &PluginManifest| {
        Ok(Arc::new(CorePlugin::new()) as Arc<dyn Plugin>)
    });
    registry.register(custom_commands::MODULE, |_m: &PluginManifest| {
        Ok(Arc::new(CustomCommandsPlugin::new()) as Arc<dyn Plugin>)
    });
    registry.register(reminders::MODULE, |_m: &PluginManifest| {
        Ok(Arc::new(RemindersPlugin::new()) as Arc<dyn Plugin>)
    });
}

/// Registry holding every bundled module
pub fn registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    register_bundled(&mut registry);
    registry
}
