//! Bot - wires the bus, router, scheduler and plugin runtime together

use std::sync::Arc;
use tracing::Span;

use super::commands::CommandRouter;
use super::context::RuntimeContext;
use super::errors::BotError;
use super::events::{Dispatch, EventBus, GatewayBridge, GatewayNotification};
use super::scheduler::Scheduler;
use crate::domain::traits::Gateway;
use crate::infrastructure::config::Config;
use crate::infrastructure::plugins::PluginRegistry;
use crate::plugins::{PluginDirectory, PluginRuntime, Services};

pub struct Bot {
    ctx: RuntimeContext,
    bus: Arc<EventBus>,
    router: Arc<CommandRouter>,
    scheduler: Arc<Scheduler>,
    plugins: PluginRuntime,
    bridge: GatewayBridge,
    gateway: Arc<dyn Gateway>,
    span: Span,
}

impl Bot {
    pub fn new(config: Config, gateway: Arc<dyn Gateway>, registry: PluginRegistry) -> Self {
        let ctx = RuntimeContext::new(config);
        let bus = Arc::new(EventBus::new(&ctx));
        let router = Arc::new(CommandRouter::new(&ctx).with_gateway(Arc::clone(&gateway)));
        router.attach(&bus);
        let scheduler = Arc::new(Scheduler::new(&ctx));

        let services = Services {
            bus: Arc::clone(&bus),
            router: Arc::clone(&router),
            scheduler: Arc::clone(&scheduler),
            gateway: Arc::clone(&gateway),
            config: ctx.shared_config(),
            directory: PluginDirectory::default(),
        };
        let plugins = PluginRuntime::new(&ctx, services, registry);
        let bridge = GatewayBridge::new(&ctx, Arc::clone(&bus));
        let span = ctx.component_span("bot");

        Self {
            ctx,
            bus,
            router,
            scheduler,
            plugins,
            bridge,
            gateway,
            span,
        }
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.ctx
    }

    pub fn config(&self) -> &Config {
        self.ctx.config()
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn plugins(&self) -> &PluginRuntime {
        &self.plugins
    }

    pub fn gateway(&self) -> Arc<dyn Gateway> {
        Arc::clone(&self.gateway)
    }

    /// Discover plugins, enable them if configured, start the scheduler and announce ready
    pub async fn start(&self) -> Result<(), BotError> {
        let loaded = self.plugins.discover()?;
        tracing::info!(parent: &self.span, loaded, "plugins loaded");

        if self.config().plugins.auto_enable {
            let enabled = self.plugins.enable_all().await;
            tracing::info!(parent: &self.span, enabled, "plugins enabled");
        }

        self.scheduler.start();
        self.handle(GatewayNotification::Ready);
        tracing::info!(parent: &self.span, "Bot started");
        Ok(())
    }

    /// Feed one gateway notification into the runtime
    pub fn handle(&self, notification: GatewayNotification) -> Vec<Dispatch> {
        self.bridge.handle(notification)
    }

    /// Stop the poll loop and disable every plugin in reverse order
    pub async fn shutdown(&self) {
        self.scheduler.stop();
        self.plugins.disable_all().await;
        tracing::info!(parent: &self.span, "Bot stopped");
    }
}
