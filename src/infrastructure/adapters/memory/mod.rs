//! In-memory gateway that records every outbound call

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::Notify;

use crate::application::errors::BotError;
use crate::application::isolation::recover;
use crate::domain::traits::{BotInfo, Gateway};

/// One message handed to [`Gateway::send_message`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: String,
    pub text: String,
}

/// Gateway that keeps outbound traffic in memory, for tests and dry runs
#[derive(Default)]
pub struct MemoryGateway {
    sent: Mutex<Vec<SentMessage>>,
    presence: Mutex<Vec<String>>,
    roles: Mutex<Vec<(String, String, String)>>,
    activity: Notify,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        recover(self.sent.lock()).clone()
    }

    /// Texts sent to one channel, oldest first
    pub fn texts_for(&self, channel_id: &str) -> Vec<String> {
        recover(self.sent.lock())
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn presence_history(&self) -> Vec<String> {
        recover(self.presence.lock()).clone()
    }

    pub fn granted_roles(&self) -> Vec<(String, String, String)> {
        recover(self.roles.lock()).clone()
    }

    /// Wait until at least `count` messages have been sent
    pub async fn wait_for_messages(&self, count: usize) {
        loop {
            let notified = self.activity.notified();
            if recover(self.sent.lock()).len() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        let id = {
            let mut sent = recover(self.sent.lock());
            sent.push(SentMessage {
                channel_id: channel_id.to_string(),
                text: text.to_string(),
            });
            sent.len()
        };
        self.activity.notify_waiters();
        Ok(format!("memory-{}", id))
    }

    async fn add_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<(), BotError> {
        recover(self.roles.lock()).push((guild_id.to_string(), user_id.to_string(), role_id.to_string()));
        Ok(())
    }

    async fn set_presence(&self, status: &str) -> Result<(), BotError> {
        recover(self.presence.lock()).push(status.to_string());
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            id: "memory".to_string(),
            name: "switchyard".to_string(),
        }
    }
}
