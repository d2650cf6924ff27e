//! Plugin runtime - discovery, dependency order and lifecycle of plugins

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::Span;

use super::context::{PluginContext, PluginDirectory, Services};
use super::graph;
use super::trait_def::{Plugin, PluginState, PluginSummary};
use crate::application::context::RuntimeContext;
use crate::application::errors::{BotError, HandlerResult, PluginError};
use crate::application::isolation::recover;
use crate::domain::entities::PluginId;
use crate::infrastructure::plugins::{Discovery, PluginLoader, PluginManifest, PluginRegistry};

struct PluginRecord {
    manifest: PluginManifest,
    state: PluginState,
    failure: Option<PluginError>,
    instance: Option<Arc<dyn Plugin>>,
    context: Option<PluginContext>,
}

impl PluginRecord {
    fn new(manifest: PluginManifest) -> Self {
        Self {
            manifest,
            state: PluginState::Unloaded,
            failure: None,
            instance: None,
            context: None,
        }
    }

    fn failed(manifest: PluginManifest, error: PluginError) -> Self {
        Self {
            state: PluginState::Failed,
            failure: Some(error),
            ..Self::new(manifest)
        }
    }

    fn summary(&self) -> PluginSummary {
        PluginSummary {
            name: self.manifest.name.clone(),
            version: self.manifest.version.clone(),
            developer: self.manifest.developer.clone(),
            description: self.manifest.description.clone(),
            dependencies: self.manifest.dependencies.clone(),
            state: self.state,
            reason: self.failure.as_ref().map(ToString::to_string),
        }
    }
}

/// Manages all plugins for the bot.
///
/// Lifecycle transitions are serialized; plugin hooks run outside of the
/// record lock so hooks and handlers may read plugin state freely.
pub struct PluginRuntime {
    records: RwLock<Vec<PluginRecord>>,
    order: RwLock<Vec<String>>,
    registry: PluginRegistry,
    services: Services,
    transitions: Mutex<()>,
    span: Span,
}

impl PluginRuntime {
    pub fn new(ctx: &RuntimeContext, services: Services, registry: PluginRegistry) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            order: RwLock::new(Vec::new()),
            registry,
            services,
            transitions: Mutex::new(()),
            span: ctx.component_span("plugin_runtime"),
        }
    }

    /// Scan the configured plugin directory and load what it finds
    pub fn discover(&self) -> Result<usize, BotError> {
        let loader = PluginLoader::new(&self.services.config.plugins.directory);
        let discovery = loader.discover()?;
        Ok(self.load_all(discovery))
    }

    /// Resolve and construct every discovered plugin, returning how many
    /// reached Loaded. Failures are recorded, never returned.
    pub fn load_all(&self, discovery: Discovery) -> usize {
        let mut rejected = Vec::new();
        for invalid in discovery.invalid {
            let manifest = PluginManifest::new(invalid.display_name()).with_path(&invalid.path);
            tracing::error!(parent: &self.span, plugin = %manifest.name, "{}", invalid.error);
            rejected.push(PluginRecord::failed(manifest, invalid.error));
        }

        let mut names = HashSet::new();
        let mut unique = Vec::new();
        for manifest in discovery.manifests {
            if names.insert(manifest.name.clone()) {
                unique.push(manifest);
            } else {
                tracing::error!(parent: &self.span, plugin = %manifest.name, "duplicate plugin name");
                let error = PluginError::Duplicate(manifest.name.clone());
                rejected.push(PluginRecord::failed(manifest, error));
            }
        }

        let resolution = graph::resolve(&unique);
        let mut pending: Vec<Option<PluginManifest>> = unique.into_iter().map(Some).collect();
        let mut take = |name: &str| {
            pending
                .iter_mut()
                .find(|slot| matches!(slot, Some(m) if m.name == name))
                .and_then(Option::take)
        };

        let mut records: Vec<PluginRecord> = Vec::new();
        for (name, error) in resolution.failed {
            tracing::error!(parent: &self.span, plugin = %name, "dependency resolution failed: {}", error);
            if let Some(manifest) = take(&name) {
                records.push(PluginRecord::failed(manifest, error));
            }
        }

        let mut loaded = 0;
        for name in &resolution.order {
            let Some(manifest) = take(name) else { continue };

            let unavailable = manifest
                .dependencies
                .iter()
                .find(|dep| {
                    self.find_in(&records, dep)
                        .is_some_and(|r| r.state == PluginState::Failed)
                })
                .cloned();
            if let Some(dep) = unavailable {
                let error = PluginError::DependencyUnavailable(dep);
                tracing::error!(parent: &self.span, plugin = %manifest.name, "{}", error);
                records.push(PluginRecord::failed(manifest, error));
                continue;
            }

            let mut record = PluginRecord::new(manifest);
            match self.registry.create(&record.manifest) {
                Ok(instance) => {
                    tracing::info!(
                        parent: &self.span,
                        plugin = %record.manifest.name,
                        version = %record.manifest.version,
                        "Loaded plugin"
                    );
                    record.instance = Some(instance);
                    record.state = PluginState::Loaded;
                    loaded += 1;
                }
                Err(error) => {
                    tracing::error!(parent: &self.span, plugin = %record.manifest.name, "{}", error);
                    record.state = PluginState::Failed;
                    record.failure = Some(error);
                }
            }
            records.push(record);
        }

        // rejected records go last so lookups by name find the accepted plugin
        records.extend(rejected);
        *recover(self.records.write()) = records;
        *recover(self.order.write()) = resolution.order;
        self.publish();
        loaded
    }

    fn find_in<'a>(&self, records: &'a [PluginRecord], name: &str) -> Option<&'a PluginRecord> {
        records.iter().find(|r| r.manifest.name == name)
    }

    /// Refresh the listing plugins see through their context
    fn publish(&self) {
        let summaries = self.summaries();
        *recover(self.services.directory.write()) = summaries;
    }

    /// Every known plugin; loadable ones in dependency order, then the rest
    pub fn summaries(&self) -> Vec<PluginSummary> {
        let records = recover(self.records.read());
        let order = recover(self.order.read());

        let mut indices: Vec<usize> = order
            .iter()
            .filter_map(|name| records.iter().position(|r| &r.manifest.name == name))
            .collect();
        let rest: Vec<usize> = (0..records.len()).filter(|i| !indices.contains(i)).collect();
        indices.extend(rest);

        indices.into_iter().map(|i| records[i].summary()).collect()
    }

    /// Load order of plugins that passed dependency resolution
    pub fn order(&self) -> Vec<String> {
        recover(self.order.read()).clone()
    }

    pub fn state(&self, name: &str) -> Option<PluginState> {
        let records = recover(self.records.read());
        self.find_in(&records, name).map(|r| r.state)
    }

    pub fn failure(&self, name: &str) -> Option<PluginError> {
        let records = recover(self.records.read());
        self.find_in(&records, name).and_then(|r| r.failure.clone())
    }

    fn set_state(&self, name: &str, state: PluginState, failure: Option<PluginError>, context: Option<PluginContext>) {
        {
            let mut records = recover(self.records.write());
            if let Some(record) = records.iter_mut().find(|r| r.manifest.name == name) {
                record.state = state;
                record.failure = failure;
                record.context = context;
            }
        }
        self.publish();
    }

    /// Enable a Loaded or Disabled plugin whose dependencies are all Enabled
    pub async fn enable(&self, name: &str) -> Result<(), PluginError> {
        let _guard = self.transitions.lock().await;
        self.enable_locked(name).await
    }

    async fn enable_locked(&self, name: &str) -> Result<(), PluginError> {
        let (manifest, instance) = {
            let records = recover(self.records.read());
            let record = self
                .find_in(&records, name)
                .ok_or_else(|| PluginError::NotFound(name.to_string()))?;

            match record.state {
                PluginState::Enabled => return Ok(()),
                PluginState::Loaded | PluginState::Disabled => {}
                state => {
                    return Err(PluginError::InvalidState {
                        name: name.to_string(),
                        action: "enable".to_string(),
                        state: state.to_string(),
                    })
                }
            }

            for dep in &record.manifest.dependencies {
                let enabled = self
                    .find_in(&records, dep)
                    .is_some_and(|d| d.state == PluginState::Enabled);
                if !enabled {
                    return Err(PluginError::DependencyUnavailable(dep.clone()));
                }
            }

            let instance = record
                .instance
                .clone()
                .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
            (record.manifest.clone(), instance)
        };

        let ctx = PluginContext::new(manifest, self.services.clone());
        let hook_ctx = ctx.clone();
        let outcome = run_hook(async move { instance.enable(&hook_ctx).await }).await;

        match outcome {
            Ok(()) => {
                self.set_state(name, PluginState::Enabled, None, Some(ctx.clone()));
                // registrations made during the hook become visible only now
                ctx.activate();
                tracing::info!(parent: &self.span, plugin = %name, "plugin enabled");
                Ok(())
            }
            Err(reason) => {
                tracing::error!(parent: &self.span, plugin = %name, "enable hook failed: {}", reason);
                ctx.revoke();
                self.purge(ctx.plugin_id());
                let error = PluginError::Hook(reason);
                self.set_state(name, PluginState::Failed, Some(error.clone()), None);
                Err(error)
            }
        }
    }

    /// Disable a plugin, first disabling every Enabled plugin that depends on it
    pub async fn disable(&self, name: &str) -> Result<(), PluginError> {
        let _guard = self.transitions.lock().await;

        let state = self
            .state(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
        match state {
            PluginState::Enabled => {}
            PluginState::Disabled => return Ok(()),
            state => {
                return Err(PluginError::InvalidState {
                    name: name.to_string(),
                    action: "disable".to_string(),
                    state: state.to_string(),
                })
            }
        }

        for dependent in self.enabled_dependents(name).into_iter().rev() {
            tracing::info!(parent: &self.span, plugin = %dependent, dependency = %name, "disabling dependent plugin");
            self.disable_locked(&dependent).await;
        }
        self.disable_locked(name).await;
        Ok(())
    }

    /// Enabled plugins that depend on `name`, directly or not, in load order
    fn enabled_dependents(&self, name: &str) -> Vec<String> {
        let records = recover(self.records.read());
        let order = recover(self.order.read());

        let mut affected: HashSet<&str> = HashSet::from([name]);
        let mut dependents = Vec::new();
        for candidate in order.iter() {
            let Some(record) = self.find_in(&records, candidate) else { continue };
            if record.manifest.dependencies.iter().any(|d| affected.contains(d.as_str())) {
                affected.insert(candidate.as_str());
                if record.state == PluginState::Enabled {
                    dependents.push(candidate.clone());
                }
            }
        }
        dependents
    }

    async fn disable_locked(&self, name: &str) {
        let (ctx, instance) = {
            let records = recover(self.records.read());
            match self.find_in(&records, name) {
                Some(record) if record.state == PluginState::Enabled => {
                    (record.context.clone(), record.instance.clone())
                }
                _ => return,
            }
        };

        if let (Some(ctx), Some(instance)) = (ctx.clone(), instance) {
            let hook_ctx = ctx.clone();
            if let Err(reason) = run_hook(async move { instance.disable(&hook_ctx).await }).await {
                tracing::error!(parent: &self.span, plugin = %name, "disable hook failed: {}", reason);
            }
            ctx.revoke();
        }

        self.purge(&PluginId::new(name));
        self.set_state(name, PluginState::Disabled, None, None);
        tracing::info!(parent: &self.span, plugin = %name, "plugin disabled");
    }

    /// Drop everything the plugin registered on the bus, router and scheduler.
    /// Callers revoke the plugin's context first, which hides all of it in one
    /// step, so the three removals need not happen under one lock.
    fn purge(&self, plugin: &PluginId) {
        let handlers = self.services.bus.unregister_all(plugin);
        let commands = self.services.router.unregister_all(plugin);
        let tasks = self.services.scheduler.cancel_all(plugin);
        tracing::debug!(parent: &self.span, %plugin, handlers, commands, tasks, "purged plugin registrations");
    }

    /// Enable every loadable plugin in dependency order, returning how many are Enabled afterwards
    pub async fn enable_all(&self) -> usize {
        let _guard = self.transitions.lock().await;
        for name in self.order() {
            if matches!(self.state(&name), Some(PluginState::Loaded | PluginState::Disabled)) {
                if let Err(e) = self.enable_locked(&name).await {
                    tracing::warn!(parent: &self.span, plugin = %name, "not enabled: {}", e);
                }
            }
        }
        self.count(PluginState::Enabled)
    }

    /// Disable every Enabled plugin in reverse dependency order
    pub async fn disable_all(&self) {
        let _guard = self.transitions.lock().await;
        for name in self.order().into_iter().rev() {
            self.disable_locked(&name).await;
        }
    }

    pub fn count(&self, state: PluginState) -> usize {
        recover(self.records.read())
            .iter()
            .filter(|r| r.state == state)
            .count()
    }

    pub fn directory(&self) -> PluginDirectory {
        Arc::clone(&self.services.directory)
    }
}

/// Run a lifecycle hook as its own task so a panic stays inside it
async fn run_hook<F>(hook: F) -> Result<(), String>
where
    F: std::future::Future<Output = HandlerResult> + Send + 'static,
{
    match tokio::spawn(hook).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(join) if join.is_panic() => Err("panicked".to_string()),
        Err(_) => Err("cancelled".to_string()),
    }
}
