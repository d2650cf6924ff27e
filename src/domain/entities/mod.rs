//! Domain entities - Core business objects with no external dependencies

pub mod actor;
pub mod event;
pub mod message;
pub mod plugin_id;

pub use actor::{Actor, Capability, Role};
pub use event::{
    ChannelEvent, ChannelUpdateEvent, CommandEvent, Event, EventType, GuildEvent,
    GuildUpdateEvent, MemberEvent, MemberUpdateEvent, MessageEditEvent, MessageEvent, RoleEvent,
    RoleUpdateEvent, TypingEvent, VoiceStateEvent,
};
pub use message::{Channel, ChannelKind, ChatMessage, Guild};
pub use plugin_id::PluginId;
