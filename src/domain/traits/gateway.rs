use async_trait::async_trait;

use crate::application::errors::BotError;

/// Outbound side of the chat gateway.
///
/// Plugin handlers call these directly; the runtime only uses
/// `send_message` to deliver command replies and denial notices.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Send a message to a channel, returning the new message id
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError>;

    /// Give a member a role in a guild
    async fn add_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<(), BotError>;

    /// Change the presence line shown for the bot
    async fn set_presence(&self, status: &str) -> Result<(), BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
}
