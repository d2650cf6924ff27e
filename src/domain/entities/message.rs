use super::Actor;
use chrono::{DateTime, Utc};

/// Kind of channel a message arrived in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Voice,
    Private,
}

impl ChannelKind {
    pub fn as_str(&self) -> &str {
        match self {
            ChannelKind::Text => "text",
            ChannelKind::Voice => "voice",
            ChannelKind::Private => "private",
        }
    }
}

/// A channel, optionally belonging to a guild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: Option<String>,
    pub guild_id: Option<String>,
    pub kind: ChannelKind,
}

impl Channel {
    pub fn text(id: impl Into<String>, guild_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            guild_id: Some(guild_id.into()),
            kind: ChannelKind::Text,
        }
    }

    pub fn private(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            guild_id: None,
            kind: ChannelKind::Private,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_private(&self) -> bool {
        self.kind == ChannelKind::Private
    }
}

/// A guild (server) the bot is a member of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

impl Guild {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Represents an incoming chat message
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub author: Actor,
    pub channel: Channel,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(channel: Channel, author: Actor, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            author,
            channel,
            timestamp: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Guild id the message belongs to, `None` for private channels
    pub fn context_id(&self) -> Option<&str> {
        self.channel.guild_id.as_deref()
    }
}
