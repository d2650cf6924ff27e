//! Scheduled task records and the actions they run

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::application::errors::{BotError, HandlerResult};
use crate::application::gate::Gate;
use crate::domain::entities::PluginId;
use crate::domain::traits::Gateway;

/// The work a scheduled task performs once it is due
#[async_trait]
pub trait TaskAction: Send + Sync {
    async fn execute(&self) -> HandlerResult;

    /// Short label for logs
    fn describe(&self) -> String {
        "task".to_string()
    }
}

#[async_trait]
impl<F, Fut> TaskAction for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn execute(&self) -> HandlerResult {
        (self)().await
    }
}

/// Somewhere a task can be enqueued on behalf of its owner
pub trait TaskSink: Send + Sync {
    fn add_task(&self, delay: Duration, action: Arc<dyn TaskAction>) -> Result<(), BotError>;
}

/// One pending unit of deferred work. Always one-shot: it is removed from the
/// scheduler before its action runs.
#[derive(Clone)]
pub struct ScheduledTask {
    id: Uuid,
    created_at: Instant,
    delay: Duration,
    owner: PluginId,
    gate: Gate,
    action: Arc<dyn TaskAction>,
}

impl ScheduledTask {
    pub fn new(delay: Duration, owner: PluginId, action: Arc<dyn TaskAction>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Instant::now(),
            delay,
            owner,
            gate: Gate::always(),
            action,
        }
    }

    /// Run only while `gate` is open; dropped unrun once it closes
    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = gate;
        self
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> &PluginId {
        &self.owner
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn action(&self) -> Arc<dyn TaskAction> {
        Arc::clone(&self.action)
    }

    /// True once `delay` has elapsed since creation; stays true
    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.delay
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("id", &self.id)
            .field("delay", &self.delay)
            .field("owner", &self.owner)
            .field("action", &self.action.describe())
            .finish()
    }
}

/// Re-enqueues a fresh copy of itself after its inner action succeeds.
///
/// The copy goes through the owner's sink, so once the owning plugin is
/// disabled the chain ends. If the inner action fails the chain also ends.
#[derive(Clone)]
pub struct Repeating {
    inner: Arc<dyn TaskAction>,
    delay: Duration,
    sink: Arc<dyn TaskSink>,
}

impl Repeating {
    pub fn new(inner: Arc<dyn TaskAction>, delay: Duration, sink: Arc<dyn TaskSink>) -> Self {
        Self { inner, delay, sink }
    }
}

#[async_trait]
impl TaskAction for Repeating {
    async fn execute(&self) -> HandlerResult {
        self.inner.execute().await?;
        match self.sink.add_task(self.delay, Arc::new(self.clone())) {
            Ok(()) => Ok(()),
            Err(BotError::CapabilityRevoked(plugin)) => {
                tracing::debug!(%plugin, task = %self.inner.describe(), "repetition stopped");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn describe(&self) -> String {
        format!("every {:?}: {}", self.delay, self.inner.describe())
    }
}

/// Sends a message to a channel
pub struct SendMessage {
    gateway: Arc<dyn Gateway>,
    channel_id: String,
    text: String,
}

impl SendMessage {
    pub fn new(gateway: Arc<dyn Gateway>, channel_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            gateway,
            channel_id: channel_id.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl TaskAction for SendMessage {
    async fn execute(&self) -> HandlerResult {
        self.gateway.send_message(&self.channel_id, &self.text).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("message to {}", self.channel_id)
    }
}

/// Changes the bot's presence line
pub struct SetPresence {
    gateway: Arc<dyn Gateway>,
    status: String,
}

impl SetPresence {
    pub fn new(gateway: Arc<dyn Gateway>, status: impl Into<String>) -> Self {
        Self {
            gateway,
            status: status.into(),
        }
    }
}

#[async_trait]
impl TaskAction for SetPresence {
    async fn execute(&self) -> HandlerResult {
        self.gateway.set_presence(&self.status).await
    }

    fn describe(&self) -> String {
        format!("presence {:?}", self.status)
    }
}
