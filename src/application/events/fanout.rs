//! Gateway adapter layer - turns raw gateway notifications into typed events

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::Span;

use super::bus::{Dispatch, EventBus};
use crate::application::commands::CommandParser;
use crate::application::context::RuntimeContext;
use crate::infrastructure::config::Config;
use crate::domain::entities::{
    Actor, Channel, ChannelEvent, ChannelUpdateEvent, ChatMessage, CommandEvent, Event, Guild,
    GuildEvent, GuildUpdateEvent, MemberEvent, MemberUpdateEvent, MessageEditEvent, MessageEvent,
    Role, RoleEvent, RoleUpdateEvent, TypingEvent, VoiceStateEvent,
};

/// A callback from the external gateway client
#[derive(Debug, Clone)]
pub enum GatewayNotification {
    Ready,
    MessageCreated(ChatMessage),
    MessageEdited { before: ChatMessage, after: ChatMessage },
    MessageDeleted(ChatMessage),
    ChannelCreated(Channel),
    ChannelUpdated { before: Channel, after: Channel },
    ChannelDeleted(Channel),
    MemberJoined { member: Actor, guild: Guild },
    MemberLeft { member: Actor, guild: Guild },
    MemberUpdated { before: Actor, after: Actor, guild: Guild },
    MemberBanned { member: Actor, guild: Guild },
    MemberUnbanned { member: Actor, guild: Guild },
    Typing { channel: Channel, user: Actor, at: DateTime<Utc> },
    VoiceStateUpdated {
        before: Actor,
        after: Actor,
        guild: Guild,
        from: Option<Channel>,
        to: Option<Channel>,
    },
    GuildJoined(Guild),
    GuildLeft(Guild),
    GuildUpdated { before: Guild, after: Guild },
    GuildAvailable(Guild),
    GuildUnavailable(Guild),
    RoleCreated { guild: Guild, role: Role },
    RoleDeleted { guild: Guild, role: Role },
    RoleUpdated { guild: Guild, before: Role, after: Role },
}

impl GatewayNotification {
    /// Guild the notification belongs to; `None` for private channels and ready
    pub fn context_id(&self) -> Option<&str> {
        match self {
            GatewayNotification::Ready => None,
            GatewayNotification::MessageCreated(m) | GatewayNotification::MessageDeleted(m) => m.context_id(),
            GatewayNotification::MessageEdited { before, .. } => before.context_id(),
            GatewayNotification::ChannelCreated(c) | GatewayNotification::ChannelDeleted(c) => c.guild_id.as_deref(),
            GatewayNotification::ChannelUpdated { before, .. } => before.guild_id.as_deref(),
            GatewayNotification::Typing { channel, .. } => channel.guild_id.as_deref(),
            GatewayNotification::MemberJoined { guild, .. }
            | GatewayNotification::MemberLeft { guild, .. }
            | GatewayNotification::MemberUpdated { guild, .. }
            | GatewayNotification::MemberBanned { guild, .. }
            | GatewayNotification::MemberUnbanned { guild, .. }
            | GatewayNotification::VoiceStateUpdated { guild, .. }
            | GatewayNotification::RoleCreated { guild, .. }
            | GatewayNotification::RoleDeleted { guild, .. }
            | GatewayNotification::RoleUpdated { guild, .. } => Some(&guild.id),
            GatewayNotification::GuildJoined(g)
            | GatewayNotification::GuildLeft(g)
            | GatewayNotification::GuildAvailable(g)
            | GatewayNotification::GuildUnavailable(g) => Some(&g.id),
            GatewayNotification::GuildUpdated { before, .. } => Some(&before.id),
        }
    }
}

/// Pure translation from one notification to its ordered events
pub struct EventFanout {
    parser: CommandParser,
    config: Arc<Config>,
}

impl EventFanout {
    pub fn new(ctx: &RuntimeContext) -> Self {
        let config = ctx.config();
        Self {
            parser: CommandParser::new(config.bot.command_prefix.clone()),
            config: ctx.shared_config(),
        }
    }

    fn is_blacklisted(&self, notification: &GatewayNotification) -> bool {
        notification
            .context_id()
            .is_some_and(|id| self.config.is_blacklisted(id))
    }

    pub fn fan_out(&self, notification: GatewayNotification) -> Vec<Event> {
        if self.is_blacklisted(&notification) {
            return Vec::new();
        }

        match notification {
            GatewayNotification::Ready => vec![Event::Ready],
            GatewayNotification::MessageCreated(message) => {
                let mut events = Vec::with_capacity(3);
                events.push(Event::MessageSent(MessageEvent { message: message.clone() }));
                let specific = MessageEvent { message: message.clone() };
                events.push(if message.channel.is_private() {
                    Event::PrivateMessageSent(specific)
                } else {
                    Event::ChannelMessageSent(specific)
                });
                if let Some(unsplit) = self.parser.strip_prefix(&message.content) {
                    let unsplit = unsplit.to_string();
                    let args = self.parser.tokenize(&unsplit);
                    events.push(Event::CommandSent(CommandEvent { message, args, unsplit }));
                }
                events
            }
            GatewayNotification::MessageEdited { before, after } => {
                let private = after.channel.is_private();
                let edit = MessageEditEvent { before, after };
                vec![
                    Event::MessageEdited(edit.clone()),
                    if private {
                        Event::PrivateMessageEdited(edit)
                    } else {
                        Event::ChannelMessageEdited(edit)
                    },
                ]
            }
            GatewayNotification::MessageDeleted(message) => {
                let private = message.channel.is_private();
                let deleted = MessageEvent { message };
                vec![
                    Event::MessageDeleted(deleted.clone()),
                    if private {
                        Event::PrivateMessageDeleted(deleted)
                    } else {
                        Event::ChannelMessageDeleted(deleted)
                    },
                ]
            }
            GatewayNotification::ChannelCreated(channel) => vec![Event::ChannelCreated(ChannelEvent { channel })],
            GatewayNotification::ChannelUpdated { before, after } => {
                vec![Event::ChannelUpdated(ChannelUpdateEvent { before, after })]
            }
            GatewayNotification::ChannelDeleted(channel) => vec![Event::ChannelDeleted(ChannelEvent { channel })],
            GatewayNotification::MemberJoined { member, guild } => vec![Event::MemberJoined(MemberEvent { member, guild })],
            GatewayNotification::MemberLeft { member, guild } => vec![Event::MemberLeft(MemberEvent { member, guild })],
            GatewayNotification::MemberUpdated { before, after, guild } => {
                vec![Event::MemberUpdated(MemberUpdateEvent { before, after, guild })]
            }
            GatewayNotification::MemberBanned { member, guild } => vec![Event::MemberBanned(MemberEvent { member, guild })],
            GatewayNotification::MemberUnbanned { member, guild } => {
                vec![Event::MemberUnbanned(MemberEvent { member, guild })]
            }
            GatewayNotification::Typing { channel, user, at } => vec![Event::MemberTyping(TypingEvent { channel, user, at })],
            GatewayNotification::VoiceStateUpdated { before, after, guild, from, to } => {
                vec![Event::MemberVoiceStateUpdated(VoiceStateEvent { before, after, guild, from, to })]
            }
            GatewayNotification::GuildJoined(guild) => vec![Event::GuildJoined(GuildEvent { guild })],
            GatewayNotification::GuildLeft(guild) => vec![Event::GuildLeft(GuildEvent { guild })],
            GatewayNotification::GuildUpdated { before, after } => vec![Event::GuildUpdated(GuildUpdateEvent { before, after })],
            GatewayNotification::GuildAvailable(guild) => vec![Event::GuildAvailable(GuildEvent { guild })],
            GatewayNotification::GuildUnavailable(guild) => vec![Event::GuildUnavailable(GuildEvent { guild })],
            GatewayNotification::RoleCreated { guild, role } => vec![Event::RoleCreated(RoleEvent { guild, role })],
            GatewayNotification::RoleDeleted { guild, role } => vec![Event::RoleDeleted(RoleEvent { guild, role })],
            GatewayNotification::RoleUpdated { guild, before, after } => {
                vec![Event::RoleUpdated(RoleUpdateEvent { guild, before, after })]
            }
        }
    }
}

/// Feeds gateway notifications into the bus, one notification at a time
pub struct GatewayBridge {
    fanout: EventFanout,
    bus: Arc<EventBus>,
    span: Span,
}

impl GatewayBridge {
    pub fn new(ctx: &RuntimeContext, bus: Arc<EventBus>) -> Self {
        Self {
            fanout: EventFanout::new(ctx),
            bus,
            span: ctx.component_span("gateway_bridge"),
        }
    }

    /// Dispatch the notification's events in fan-out order
    pub fn handle(&self, notification: GatewayNotification) -> Vec<Dispatch> {
        if let GatewayNotification::MessageCreated(message) = &notification {
            tracing::info!(parent: &self.span, "{}: {}", message.author, message.content);
        }

        self.fanout
            .fan_out(notification)
            .into_iter()
            .map(|event| self.bus.dispatch(event))
            .collect()
    }
}
