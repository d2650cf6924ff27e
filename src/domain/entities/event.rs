//! Typed events dispatched on the event bus.
//!
//! Every event type has a fixed payload; the bus routes on [`EventType`] and
//! never looks inside.

use chrono::{DateTime, Utc};
use std::fmt;

use super::{Actor, Channel, ChatMessage, Guild, Role};

/// Closed set of event types known at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    Ready,
    MessageSent,
    ChannelMessageSent,
    PrivateMessageSent,
    MessageEdited,
    ChannelMessageEdited,
    PrivateMessageEdited,
    MessageDeleted,
    ChannelMessageDeleted,
    PrivateMessageDeleted,
    CommandSent,
    ChannelCreated,
    ChannelUpdated,
    ChannelDeleted,
    MemberJoined,
    MemberLeft,
    MemberUpdated,
    MemberBanned,
    MemberUnbanned,
    MemberTyping,
    MemberVoiceStateUpdated,
    GuildJoined,
    GuildLeft,
    GuildUpdated,
    GuildAvailable,
    GuildUnavailable,
    RoleCreated,
    RoleDeleted,
    RoleUpdated,
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Ready => "ready",
            EventType::MessageSent => "message_sent",
            EventType::ChannelMessageSent => "channel_message_sent",
            EventType::PrivateMessageSent => "private_message_sent",
            EventType::MessageEdited => "message_edited",
            EventType::ChannelMessageEdited => "channel_message_edited",
            EventType::PrivateMessageEdited => "private_message_edited",
            EventType::MessageDeleted => "message_deleted",
            EventType::ChannelMessageDeleted => "channel_message_deleted",
            EventType::PrivateMessageDeleted => "private_message_deleted",
            EventType::CommandSent => "command_sent",
            EventType::ChannelCreated => "channel_created",
            EventType::ChannelUpdated => "channel_updated",
            EventType::ChannelDeleted => "channel_deleted",
            EventType::MemberJoined => "member_joined",
            EventType::MemberLeft => "member_left",
            EventType::MemberUpdated => "member_updated",
            EventType::MemberBanned => "member_banned",
            EventType::MemberUnbanned => "member_unbanned",
            EventType::MemberTyping => "member_typing",
            EventType::MemberVoiceStateUpdated => "member_voice_state_updated",
            EventType::GuildJoined => "guild_joined",
            EventType::GuildLeft => "guild_left",
            EventType::GuildUpdated => "guild_updated",
            EventType::GuildAvailable => "guild_available",
            EventType::GuildUnavailable => "guild_unavailable",
            EventType::RoleCreated => "role_created",
            EventType::RoleDeleted => "role_deleted",
            EventType::RoleUpdated => "role_updated",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub message: ChatMessage,
}

#[derive(Debug, Clone)]
pub struct MessageEditEvent {
    pub before: ChatMessage,
    pub after: ChatMessage,
}

/// A message that started with the command prefix
#[derive(Debug, Clone)]
pub struct CommandEvent {
    pub message: ChatMessage,
    /// Tokenized arguments; the first one is the command name
    pub args: Vec<String>,
    /// Message content with the prefix removed
    pub unsplit: String,
}

impl CommandEvent {
    pub fn command(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ChannelEvent {
    pub channel: Channel,
}

#[derive(Debug, Clone)]
pub struct ChannelUpdateEvent {
    pub before: Channel,
    pub after: Channel,
}

#[derive(Debug, Clone)]
pub struct MemberEvent {
    pub member: Actor,
    pub guild: Guild,
}

#[derive(Debug, Clone)]
pub struct MemberUpdateEvent {
    pub before: Actor,
    pub after: Actor,
    pub guild: Guild,
}

/// A member joined, left or moved between voice channels
#[derive(Debug, Clone)]
pub struct VoiceStateEvent {
    pub before: Actor,
    pub after: Actor,
    pub guild: Guild,
    pub from: Option<Channel>,
    pub to: Option<Channel>,
}

#[derive(Debug, Clone)]
pub struct TypingEvent {
    pub channel: Channel,
    pub user: Actor,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GuildEvent {
    pub guild: Guild,
}

#[derive(Debug, Clone)]
pub struct GuildUpdateEvent {
    pub before: Guild,
    pub after: Guild,
}

#[derive(Debug, Clone)]
pub struct RoleEvent {
    pub guild: Guild,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct RoleUpdateEvent {
    pub guild: Guild,
    pub before: Role,
    pub after: Role,
}

/// Immutable event record, one variant per [`EventType`]
#[derive(Debug, Clone)]
pub enum Event {
    Ready,
    MessageSent(MessageEvent),
    ChannelMessageSent(MessageEvent),
    PrivateMessageSent(MessageEvent),
    MessageEdited(MessageEditEvent),
    ChannelMessageEdited(MessageEditEvent),
    PrivateMessageEdited(MessageEditEvent),
    MessageDeleted(MessageEvent),
    ChannelMessageDeleted(MessageEvent),
    PrivateMessageDeleted(MessageEvent),
    CommandSent(CommandEvent),
    ChannelCreated(ChannelEvent),
    ChannelUpdated(ChannelUpdateEvent),
    ChannelDeleted(ChannelEvent),
    MemberJoined(MemberEvent),
    MemberLeft(MemberEvent),
    MemberUpdated(MemberUpdateEvent),
    MemberBanned(MemberEvent),
    MemberUnbanned(MemberEvent),
    MemberTyping(TypingEvent),
    MemberVoiceStateUpdated(VoiceStateEvent),
    GuildJoined(GuildEvent),
    GuildLeft(GuildEvent),
    GuildUpdated(GuildUpdateEvent),
    GuildAvailable(GuildEvent),
    GuildUnavailable(GuildEvent),
    RoleCreated(RoleEvent),
    RoleDeleted(RoleEvent),
    RoleUpdated(RoleUpdateEvent),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Ready => EventType::Ready,
            Event::MessageSent(_) => EventType::MessageSent,
            Event::ChannelMessageSent(_) => EventType::ChannelMessageSent,
            Event::PrivateMessageSent(_) => EventType::PrivateMessageSent,
            Event::MessageEdited(_) => EventType::MessageEdited,
            Event::ChannelMessageEdited(_) => EventType::ChannelMessageEdited,
            Event::PrivateMessageEdited(_) => EventType::PrivateMessageEdited,
            Event::MessageDeleted(_) => EventType::MessageDeleted,
            Event::ChannelMessageDeleted(_) => EventType::ChannelMessageDeleted,
            Event::PrivateMessageDeleted(_) => EventType::PrivateMessageDeleted,
            Event::CommandSent(_) => EventType::CommandSent,
            Event::ChannelCreated(_) => EventType::ChannelCreated,
            Event::ChannelUpdated(_) => EventType::ChannelUpdated,
            Event::ChannelDeleted(_) => EventType::ChannelDeleted,
            Event::MemberJoined(_) => EventType::MemberJoined,
            Event::MemberLeft(_) => EventType::MemberLeft,
            Event::MemberUpdated(_) => EventType::MemberUpdated,
            Event::MemberBanned(_) => EventType::MemberBanned,
            Event::MemberUnbanned(_) => EventType::MemberUnbanned,
            Event::MemberTyping(_) => EventType::MemberTyping,
            Event::MemberVoiceStateUpdated(_) => EventType::MemberVoiceStateUpdated,
            Event::GuildJoined(_) => EventType::GuildJoined,
            Event::GuildLeft(_) => EventType::GuildLeft,
            Event::GuildUpdated(_) => EventType::GuildUpdated,
            Event::GuildAvailable(_) => EventType::GuildAvailable,
            Event::GuildUnavailable(_) => EventType::GuildUnavailable,
            Event::RoleCreated(_) => EventType::RoleCreated,
            Event::RoleDeleted(_) => EventType::RoleDeleted,
            Event::RoleUpdated(_) => EventType::RoleUpdated,
        }
    }

    /// The message carried by message-sent and message-deleted events
    pub fn message(&self) -> Option<&ChatMessage> {
        match self {
            Event::MessageSent(e)
            | Event::ChannelMessageSent(e)
            | Event::PrivateMessageSent(e)
            | Event::MessageDeleted(e)
            | Event::ChannelMessageDeleted(e)
            | Event::PrivateMessageDeleted(e) => Some(&e.message),
            Event::CommandSent(e) => Some(&e.message),
            _ => None,
        }
    }
}
