//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::application::errors::BotError;
use crate::application::events::GatewayNotification;
use crate::domain::entities::{Actor, Channel, ChatMessage};
use crate::domain::traits::{BotInfo, Gateway};

pub const CONSOLE_CHANNEL: &str = "console";

/// Console gateway for local development: outbound traffic goes to stdout
pub struct ConsoleGateway {
    info: BotInfo,
}

impl ConsoleGateway {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: name.into(),
            },
        }
    }
}

impl Default for ConsoleGateway {
    fn default() -> Self {
        Self::new("switchyard")
    }
}

async fn write_line(line: &str) -> Result<(), BotError> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("{}\n", line).as_bytes())
        .await
        .map_err(|e| BotError::Gateway(e.to_string()))?;
    stdout.flush().await.map_err(|e| BotError::Gateway(e.to_string()))
}

#[async_trait]
impl Gateway for ConsoleGateway {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        write_line(&format!("[BOT -> {}] {}", channel_id, text)).await?;
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn add_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<(), BotError> {
        write_line(&format!("[BOT] role {} given to {} in {}", role_id, user_id, guild_id)).await
    }

    async fn set_presence(&self, status: &str) -> Result<(), BotError> {
        write_line(&format!("[BOT] now playing: {}", status)).await
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

/// Reads stdin; every line is a message from `author` in a private channel
pub struct ConsoleInput {
    lines: Lines<BufReader<Stdin>>,
    author: Actor,
    channel: Channel,
}

impl ConsoleInput {
    pub fn new(author: Actor) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            author,
            channel: Channel::private(CONSOLE_CHANNEL).with_name("console"),
        }
    }

    /// Next notification; `None` at end of input
    pub async fn next(&mut self) -> Option<GatewayNotification> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!("Failed to read console input: {}", e);
                    return None;
                }
            };

            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            let message = ChatMessage::new(self.channel.clone(), self.author.clone(), text);
            return Some(GatewayNotification::MessageCreated(message));
        }
    }
}
