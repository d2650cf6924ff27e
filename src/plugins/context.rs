//! Capability object handed to a plugin while it is enabled

use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::trait_def::PluginSummary;
use crate::application::commands::{CommandHandler, CommandInfo, CommandRouter};
use crate::application::errors::{BotError, HandlerResult};
use crate::application::events::{EventBus, EventHandler, HandlerHandle};
use crate::application::gate::Gate;
use crate::application::isolation::recover;
use crate::application::scheduler::{Repeating, ScheduledTask, Scheduler, TaskAction, TaskSink};
use crate::domain::entities::{Actor, EventType, PluginId};
use crate::domain::traits::Gateway;
use crate::domain::Permission;
use crate::infrastructure::config::Config;
use crate::infrastructure::plugins::PluginManifest;

/// Read-only listing of every known plugin, refreshed by the runtime
pub type PluginDirectory = Arc<RwLock<Vec<PluginSummary>>>;

/// Shared runtime services a capability object is cut from
#[derive(Clone)]
pub struct Services {
    pub bus: Arc<EventBus>,
    pub router: Arc<CommandRouter>,
    pub scheduler: Arc<Scheduler>,
    pub gateway: Arc<dyn Gateway>,
    pub config: Arc<Config>,
    pub directory: PluginDirectory,
}

struct Grant {
    plugin: PluginId,
    manifest: PluginManifest,
    services: Services,
    gate: Gate,
    live: RwLock<bool>,
}

/// Narrow, revocable view of the runtime for one activation of one plugin.
///
/// Every registration is made under the plugin's own id and behind the
/// activation's [`Gate`]. Registrations made before [`activate`](Self::activate)
/// are stored but never dispatched, routed or run; once the plugin is disabled
/// the object is revoked: the gate closes, registration calls fail with
/// [`BotError::CapabilityRevoked`] and register nothing. A later re-enable
/// hands out a fresh object; old clones stay revoked.
#[derive(Clone)]
pub struct PluginContext {
    grant: Arc<Grant>,
}

impl PluginContext {
    pub(crate) fn new(manifest: PluginManifest, services: Services) -> Self {
        Self {
            grant: Arc::new(Grant {
                plugin: PluginId::new(manifest.name.clone()),
                manifest,
                services,
                gate: Gate::pending(),
                live: RwLock::new(true),
            }),
        }
    }

    pub fn plugin_id(&self) -> &PluginId {
        &self.grant.plugin
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.grant.manifest
    }

    /// Directory the plugin's manifest was read from; plugins keep their data here
    pub fn data_dir(&self) -> &Path {
        &self.grant.manifest.path
    }

    pub fn config(&self) -> &Config {
        &self.grant.services.config
    }

    /// Outbound gateway operations are not mediated by the runtime
    pub fn gateway(&self) -> Arc<dyn Gateway> {
        Arc::clone(&self.grant.services.gateway)
    }

    pub fn is_live(&self) -> bool {
        *recover(self.grant.live.read())
    }

    /// Make everything registered so far, and from now on, visible
    pub(crate) fn activate(&self) -> bool {
        self.grant.gate.open()
    }

    /// Blocks until in-flight registrations finish; everything after fails.
    /// Closing the gate hides every registration of this activation at once,
    /// before the runtime purges them.
    pub(crate) fn revoke(&self) {
        let mut live = recover(self.grant.live.write());
        *live = false;
        self.grant.gate.close();
    }

    fn revoked(&self, operation: &str) -> BotError {
        tracing::error!(plugin = %self.grant.plugin, operation, "capability used after the plugin was disabled");
        BotError::CapabilityRevoked(self.grant.plugin.to_string())
    }

    /// Run `f` while holding the gate open, so a concurrent revoke waits for it
    fn with_live<T>(&self, f: impl FnOnce(&Services, &PluginId) -> T) -> Option<T> {
        let live = recover(self.grant.live.read());
        if !*live {
            return None;
        }
        Some(f(&self.grant.services, &self.grant.plugin))
    }

    pub fn register_handler<H>(&self, event_type: EventType, handler: H) -> HandlerResult<HandlerHandle>
    where
        H: EventHandler + 'static,
    {
        self.with_live(|s, plugin| {
            s.bus
                .register_gated(event_type, handler, plugin.clone(), self.grant.gate.clone())
        })
            .ok_or_else(|| self.revoked("register_handler"))
    }

    pub fn unregister_handler(&self, handle: &HandlerHandle) -> bool {
        self.with_live(|s, _| s.bus.unregister(handle)).unwrap_or(false)
    }

    pub fn register_command<H>(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        permission: Permission,
        handler: H,
    ) -> HandlerResult
    where
        H: CommandHandler + 'static,
    {
        let name = name.into();
        let description = description.into();
        let gate = self.grant.gate.clone();
        match self.with_live(|s, plugin| s.router.register_gated(name, description, permission, plugin.clone(), gate, handler)) {
            Some(result) => result.map_err(BotError::from),
            None => Err(self.revoked("register_command")),
        }
    }

    /// Remove one of this plugin's own commands
    pub fn unregister_command(&self, name: &str) -> bool {
        self.with_live(|s, plugin| s.router.unregister(name, plugin))
            .unwrap_or(false)
    }

    pub fn add_task<A>(&self, delay: Duration, action: A) -> HandlerResult
    where
        A: TaskAction + 'static,
    {
        self.enqueue(delay, Arc::new(action))
            .ok_or_else(|| self.revoked("add_task"))
    }

    /// Schedule `action` every `interval` until the plugin is disabled or the action fails
    pub fn add_repeating_task<A>(&self, interval: Duration, action: A) -> HandlerResult
    where
        A: TaskAction + 'static,
    {
        let sink: Arc<dyn TaskSink> = Arc::new(self.clone());
        let repeating = Repeating::new(Arc::new(action), interval, sink);
        self.add_task(interval, repeating)
    }

    fn enqueue(&self, delay: Duration, action: Arc<dyn TaskAction>) -> Option<()> {
        self.with_live(|s, plugin| {
            s.scheduler
                .add_task(ScheduledTask::new(delay, plugin.clone(), action).with_gate(self.grant.gate.clone()))
        })
    }

    pub fn command_exists(&self, name: &str) -> bool {
        self.grant.services.router.contains(name)
    }

    pub fn available_commands(&self, actor: &Actor) -> Vec<CommandInfo> {
        self.grant.services.router.list_available(actor)
    }

    pub fn command_prefix(&self) -> &str {
        self.grant.services.router.parser().prefix()
    }

    pub fn plugin_summaries(&self) -> Vec<PluginSummary> {
        recover(self.grant.services.directory.read()).clone()
    }
}

/// Re-adds from a repeating task end quietly once the plugin is disabled
impl TaskSink for PluginContext {
    fn add_task(&self, delay: Duration, action: Arc<dyn TaskAction>) -> Result<(), BotError> {
        self.enqueue(delay, action)
            .ok_or_else(|| BotError::CapabilityRevoked(self.grant.plugin.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::commands::{CommandInvocation, RouteOutcome};
    use crate::application::context::RuntimeContext;
    use crate::domain::entities::{Channel, ChatMessage, Event};
    use crate::infrastructure::adapters::memory::MemoryGateway;

    pub(crate) fn services() -> Services {
        let ctx = RuntimeContext::default();
        Services {
            bus: Arc::new(EventBus::new(&ctx)),
            router: Arc::new(CommandRouter::new(&ctx)),
            scheduler: Arc::new(Scheduler::new(&ctx)),
            gateway: Arc::new(MemoryGateway::new()),
            config: ctx.shared_config(),
            directory: PluginDirectory::default(),
        }
    }

    async fn noop(_event: Arc<Event>) -> HandlerResult {
        Ok(())
    }

    async fn tick() -> HandlerResult {
        Ok(())
    }

    #[tokio::test]
    async fn registrations_use_plugin_id() {
        let services = services();
        let ctx = PluginContext::new(PluginManifest::new("alpha"), services.clone());

        ctx.register_handler(EventType::Ready, noop).unwrap();
        ctx.register_command("hello", "", Permission::Public, |_inv: CommandInvocation| async {
            Ok::<_, BotError>(None)
        })
        .unwrap();
        ctx.add_task(Duration::from_secs(5), tick).unwrap();
        assert!(ctx.activate());

        assert_eq!(services.bus.snapshot(EventType::Ready)[0].owner(), &PluginId::from("alpha"));
        assert_eq!(services.router.describe("hello").map(|c| c.owner), Some(PluginId::from("alpha")));
        assert_eq!(services.scheduler.pending_for(&"alpha".into()), 1);
    }

    #[tokio::test]
    async fn nothing_is_visible_before_activation() {
        let services = services();
        let ctx = PluginContext::new(PluginManifest::new("alpha"), services.clone());
        ctx.register_handler(EventType::Ready, noop).unwrap();
        ctx.register_command("hello", "", Permission::Public, |_inv: CommandInvocation| async {
            Ok::<_, BotError>(Some("hi".to_string()))
        })
        .unwrap();
        ctx.add_task(Duration::ZERO, tick).unwrap();

        let actor = Actor::new("1", "anyone");
        let message = ChatMessage::new(Channel::text("c", "g"), actor.clone(), "!hello");
        assert!(services.bus.snapshot(EventType::Ready).is_empty());
        assert!(matches!(services.router.route("!hello", &actor, &message), RouteOutcome::Unknown(_)));
        assert!(services.scheduler.poll_once(tokio::time::Instant::now()).is_empty());
        assert_eq!(services.scheduler.pending_count(), 1);
    }

    #[tokio::test]
    async fn revoke_hides_everything_before_the_purge() {
        let services = services();
        let ctx = PluginContext::new(PluginManifest::new("alpha"), services.clone());
        ctx.activate();
        ctx.register_handler(EventType::Ready, noop).unwrap();
        ctx.register_command("hello", "", Permission::Public, |_inv: CommandInvocation| async {
            Ok::<_, BotError>(None)
        })
        .unwrap();
        ctx.add_task(Duration::ZERO, tick).unwrap();

        ctx.revoke();
        let actor = Actor::new("1", "anyone");
        let message = ChatMessage::new(Channel::text("c", "g"), actor.clone(), "!hello");
        assert_eq!(services.bus.handler_count(EventType::Ready), 1);
        assert!(services.bus.dispatch(Event::Ready).owners().is_empty());
        assert!(matches!(services.router.route("!hello", &actor, &message), RouteOutcome::Unknown(_)));
        assert!(services.scheduler.poll_once(tokio::time::Instant::now()).is_empty());
        assert!(!ctx.activate());
    }

    #[tokio::test]
    async fn revoked_context_registers_nothing() {
        let services = services();
        let ctx = PluginContext::new(PluginManifest::new("alpha"), services.clone());
        let stale = ctx.clone();
        ctx.revoke();

        assert!(matches!(
            stale.register_handler(EventType::Ready, noop),
            Err(BotError::CapabilityRevoked(p)) if p == "alpha"
        ));
        assert!(stale.add_task(Duration::from_secs(1), tick).is_err());
        assert!(stale.add_repeating_task(Duration::from_secs(1), tick).is_err());
        assert!(TaskSink::add_task(&stale, Duration::from_secs(1), Arc::new(tick)).is_err());
        assert_eq!(services.bus.handler_count(EventType::Ready), 0);
        assert_eq!(services.scheduler.pending_count(), 0);
        assert!(!stale.is_live());
    }

    #[tokio::test]
    async fn duplicate_command_is_rejected_through_context() {
        let services = services();
        let first = PluginContext::new(PluginManifest::new("first"), services.clone());
        let second = PluginContext::new(PluginManifest::new("second"), services.clone());
        let handler = |_inv: CommandInvocation| async { Ok::<_, BotError>(Some("x".to_string())) };

        first.register_command("ping", "", Permission::Public, handler).unwrap();
        assert!(matches!(
            second.register_command("ping", "", Permission::Public, handler),
            Err(BotError::Command(_))
        ));
        assert!(!second.unregister_command("ping"));
        assert!(first.unregister_command("ping"));
    }
}
