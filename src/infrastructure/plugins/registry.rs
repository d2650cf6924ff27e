//! Plugin registry - compiled-in plugin constructors keyed by module name

use std::collections::HashMap;
use std::sync::Arc;

use super::manifest::PluginManifest;
use crate::application::errors::{BotError, PluginError};
use crate::plugins::Plugin;

/// Builds a plugin instance from its manifest
pub type PluginFactory = Arc<dyn Fn(&PluginManifest) -> Result<Arc<dyn Plugin>, BotError> + Send + Sync>;

/// Registry of plugin modules the binary knows how to construct
#[derive(Clone, Default)]
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor; a later registration for the same module replaces it
    pub fn register<F>(&mut self, module_name: impl Into<String>, factory: F)
    where
        F: Fn(&PluginManifest) -> Result<Arc<dyn Plugin>, BotError> + Send + Sync + 'static,
    {
        self.factories.insert(module_name.into(), Arc::new(factory));
    }

    pub fn contains(&self, module_name: &str) -> bool {
        self.factories.contains_key(module_name)
    }

    /// Run the constructor for the manifest's module
    pub fn create(&self, manifest: &PluginManifest) -> Result<Arc<dyn Plugin>, PluginError> {
        let factory = self
            .factories
            .get(&manifest.module_name)
            .ok_or_else(|| PluginError::UnknownModule(manifest.module_name.clone()))?;

        factory(manifest).map_err(|e| PluginError::Construction(e.to_string()))
    }

    /// Get all module names, sorted
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::HandlerResult;
    use crate::plugins::PluginContext;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Plugin for Noop {
        async fn enable(&self, _ctx: &PluginContext) -> HandlerResult {
            Ok(())
        }
    }

    #[test]
    fn create_uses_module_name() {
        let mut registry = PluginRegistry::new();
        registry.register("noop", |_m: &PluginManifest| Ok(Arc::new(Noop) as Arc<dyn Plugin>));

        let manifest = PluginManifest::new("friendly name").with_module("noop");
        assert!(registry.create(&manifest).is_ok());

        let unknown = PluginManifest::new("other");
        assert!(matches!(
            registry.create(&unknown),
            Err(PluginError::UnknownModule(m)) if m == "other"
        ));
    }

    #[test]
    fn constructor_errors_are_reported() {
        let mut registry = PluginRegistry::new();
        registry.register("broken", |_m: &PluginManifest| {
            Err::<Arc<dyn Plugin>, BotError>(BotError::internal("no config"))
        });

        let err = registry.create(&PluginManifest::new("broken")).err();
        assert!(matches!(err, Some(PluginError::Construction(_))));
        assert_eq!(registry.module_names(), vec!["broken".to_string()]);
    }
}
