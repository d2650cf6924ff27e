//! Command router - permission-gated dispatch of prefixed chat commands

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::Span;

use super::parser::CommandParser;
use crate::application::context::RuntimeContext;
use crate::application::errors::{BotError, CommandError, HandlerResult};
use crate::application::events::bus::{EventBus, HandlerHandle};
use crate::application::gate::Gate;
use crate::application::isolation::{recover, spawn_isolated, Boundary};
use crate::domain::entities::{Actor, ChatMessage, Event, EventType, PluginId};
use crate::domain::traits::Gateway;
use crate::domain::Permission;
use crate::infrastructure::config::DenialPolicy;

/// Everything a command handler gets to see
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    pub name: String,
    pub args: Vec<String>,
    pub unsplit: String,
    pub actor: Actor,
    pub message: ChatMessage,
}

/// Handles one command; a returned string is sent back to the channel
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn call(&self, invocation: CommandInvocation) -> HandlerResult<Option<String>>;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(CommandInvocation) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult<Option<String>>> + Send + 'static,
{
    async fn call(&self, invocation: CommandInvocation) -> HandlerResult<Option<String>> {
        (self)(invocation).await
    }
}

#[derive(Clone)]
struct CommandRegistration {
    description: String,
    permission: Permission,
    owner: PluginId,
    gate: Gate,
    handler: Arc<dyn CommandHandler>,
}

/// Public view of a registered command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
    pub owner: PluginId,
}

/// What [`CommandRouter::route`] did with a piece of text
pub enum RouteOutcome {
    /// Text does not start with the prefix
    NotCommand,
    /// No such command; prefixed chat text is common, so this is not an error
    Unknown(String),
    /// The permission predicate was false for the actor
    Denied(String),
    /// Handler launched
    Dispatched(CommandTask),
}

impl RouteOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, RouteOutcome::Dispatched(_))
    }
}

/// A running command handler
pub struct CommandTask {
    handle: JoinHandle<Option<Option<String>>>,
}

impl CommandTask {
    /// Wait for the handler; `None` if it failed or produced no reply
    pub async fn reply(self) -> Option<String> {
        self.handle.await.ok().flatten().flatten()
    }
}

pub struct CommandRouter {
    parser: CommandParser,
    denial: DenialPolicy,
    commands: RwLock<BTreeMap<String, CommandRegistration>>,
    gateway: Option<Arc<dyn Gateway>>,
    span: Span,
}

impl CommandRouter {
    pub fn new(ctx: &RuntimeContext) -> Self {
        let config = ctx.config();
        Self {
            parser: CommandParser::new(config.bot.command_prefix.clone()),
            denial: config.commands.denial,
            commands: RwLock::new(BTreeMap::new()),
            gateway: None,
            span: ctx.component_span("command_router"),
        }
    }

    /// Gateway used for replies and denial notices
    pub fn with_gateway(mut self, gateway: Arc<dyn Gateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Register a command. The first registration of a name wins; later ones
    /// are rejected until the owner of the first is purged.
    pub fn register<H>(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        permission: Permission,
        owner: PluginId,
        handler: H,
    ) -> Result<(), CommandError>
    where
        H: CommandHandler + 'static,
    {
        self.register_gated(name, description, permission, owner, Gate::always(), handler)
    }

    /// Register a command that routes only while `gate` is open. A pending
    /// registration still reserves its name.
    pub fn register_gated<H>(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        permission: Permission,
        owner: PluginId,
        gate: Gate,
        handler: H,
    ) -> Result<(), CommandError>
    where
        H: CommandHandler + 'static,
    {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(CommandError::InvalidName(name));
        }

        let mut commands = recover(self.commands.write());
        if let Some(existing) = commands.get(&name) {
            tracing::warn!(
                parent: &self.span,
                command = %name,
                plugin = %owner,
                registered_by = %existing.owner,
                "rejecting duplicate command registration"
            );
            return Err(CommandError::Duplicate {
                name,
                owner: existing.owner.to_string(),
            });
        }

        tracing::debug!(parent: &self.span, command = %name, plugin = %owner, "registering command");
        commands.insert(
            name,
            CommandRegistration {
                description: description.into(),
                permission,
                owner,
                gate,
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Remove every command owned by `owner`
    pub fn unregister_all(&self, owner: &PluginId) -> usize {
        let mut commands = recover(self.commands.write());
        let before = commands.len();
        commands.retain(|_, reg| reg.owner != *owner);
        let removed = before - commands.len();
        if removed > 0 {
            tracing::debug!(parent: &self.span, plugin = %owner, removed, "unregistered commands");
        }
        removed
    }

    /// Remove one command, only if `owner` registered it
    pub fn unregister(&self, name: &str, owner: &PluginId) -> bool {
        let mut commands = recover(self.commands.write());
        match commands.get(name) {
            Some(reg) if reg.owner == *owner => {
                commands.remove(name);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        recover(self.commands.read()).contains_key(name)
    }

    pub fn describe(&self, name: &str) -> Option<CommandInfo> {
        recover(self.commands.read())
            .get(name)
            .map(|reg| Self::info(name, reg))
    }

    /// Commands the actor is allowed to run, sorted by name
    pub fn list_available(&self, actor: &Actor) -> Vec<CommandInfo> {
        recover(self.commands.read())
            .iter()
            .filter(|(_, reg)| reg.gate.is_open() && reg.permission.allows(actor))
            .map(|(name, reg)| Self::info(name, reg))
            .collect()
    }

    pub fn len(&self) -> usize {
        recover(self.commands.read()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn info(name: &str, reg: &CommandRegistration) -> CommandInfo {
        CommandInfo {
            name: name.to_string(),
            description: reg.description.clone(),
            owner: reg.owner.clone(),
        }
    }

    /// Route raw chat text to its command handler
    pub fn route(&self, raw_text: &str, actor: &Actor, message: &ChatMessage) -> RouteOutcome {
        let Some(parsed) = self.parser.parse(raw_text) else {
            return RouteOutcome::NotCommand;
        };

        let registration = recover(self.commands.read())
            .get(&parsed.name)
            .filter(|reg| reg.gate.is_open())
            .cloned();
        let Some(registration) = registration else {
            tracing::trace!(parent: &self.span, command = %parsed.name, "unknown command");
            return RouteOutcome::Unknown(parsed.name);
        };

        if !registration.permission.allows(actor) {
            tracing::info!(parent: &self.span, command = %parsed.name, actor = %actor, "permission denied");
            if self.denial == DenialPolicy::Notice {
                self.send_denial_notice(&parsed.name, message);
            }
            return RouteOutcome::Denied(parsed.name);
        }

        tracing::debug!(parent: &self.span, command = %parsed.name, plugin = %registration.owner, "invoking command");
        let boundary = Boundary::Command {
            command: parsed.name.clone(),
            plugin: registration.owner.clone(),
        };
        let channel_id = message.channel.id.clone();
        let gateway = self.gateway.clone();
        let handler = Arc::clone(&registration.handler);
        let invocation = CommandInvocation {
            name: parsed.name,
            args: parsed.args,
            unsplit: parsed.unsplit,
            actor: actor.clone(),
            message: message.clone(),
        };

        let handle = spawn_isolated(boundary, self.span.clone(), async move {
            let reply = handler.call(invocation).await?;
            if let (Some(text), Some(gateway)) = (&reply, gateway) {
                if let Err(e) = gateway.send_message(&channel_id, text).await {
                    tracing::warn!(channel = %channel_id, "failed to send command reply: {}", e);
                }
            }
            Ok(reply)
        });

        RouteOutcome::Dispatched(CommandTask { handle })
    }

    fn send_denial_notice(&self, name: &str, message: &ChatMessage) {
        let Some(gateway) = self.gateway.clone() else {
            return;
        };
        let channel_id = message.channel.id.clone();
        let text = format!(
            "You do not have permission to use {}{}.",
            self.parser.prefix(),
            name
        );
        tokio::spawn(async move {
            if let Err(e) = gateway.send_message(&channel_id, &text).await {
                tracing::warn!(channel = %channel_id, "failed to send denial notice: {}", e);
            }
        });
    }

    /// Subscribe the router to chat messages on the bus
    pub fn attach(self: &Arc<Self>, bus: &EventBus) -> HandlerHandle {
        let router = Arc::clone(self);
        bus.register(
            EventType::MessageSent,
            move |event: Arc<Event>| {
                let router = Arc::clone(&router);
                async move {
                    if let Event::MessageSent(sent) = event.as_ref() {
                        let message = &sent.message;
                        router.route(&message.content, &message.author, message);
                    }
                    Ok::<_, BotError>(())
                }
            },
            PluginId::runtime(),
        )
    }
}
