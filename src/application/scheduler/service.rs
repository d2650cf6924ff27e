//! Cooperative task scheduler.
//!
//! A poll loop wakes every tick, removes every due task from the pending set
//! and launches each one as its own tokio task. The scheduler itself only knows
//! one-shot tasks; see [`Repeating`](super::task::Repeating) for repetition.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::Span;

use super::task::ScheduledTask;
use crate::application::context::RuntimeContext;
use crate::application::isolation::{recover, spawn_isolated, Boundary};
use crate::domain::entities::PluginId;

pub struct Scheduler {
    pending: Mutex<Vec<ScheduledTask>>,
    tick: Duration,
    timer_handle: Mutex<Option<JoinHandle<()>>>,
    span: Span,
}

impl Scheduler {
    pub fn new(ctx: &RuntimeContext) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            tick: ctx.config().scheduler.tick(),
            timer_handle: Mutex::new(None),
            span: ctx.component_span("scheduler"),
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    pub fn add_task(&self, task: ScheduledTask) {
        tracing::debug!(
            parent: &self.span,
            task = %task.id(),
            plugin = %task.owner(),
            delay_ms = task.delay().as_millis() as u64,
            "task added"
        );
        recover(self.pending.lock()).push(task);
    }

    /// Drop every pending task owned by `owner`. Tasks already launched keep running.
    pub fn cancel_all(&self, owner: &PluginId) -> usize {
        let mut pending = recover(self.pending.lock());
        let before = pending.len();
        pending.retain(|t| t.owner() != owner);
        let removed = before - pending.len();
        if removed > 0 {
            tracing::debug!(parent: &self.span, plugin = %owner, removed, "cancelled pending tasks");
        }
        removed
    }

    pub fn pending_count(&self) -> usize {
        recover(self.pending.lock()).len()
    }

    pub fn pending_for(&self, owner: &PluginId) -> usize {
        recover(self.pending.lock())
            .iter()
            .filter(|t| t.owner() == owner)
            .count()
    }

    /// Remove and launch every task due at `now`
    pub fn poll_once(&self, now: Instant) -> Vec<JoinHandle<Option<()>>> {
        let due: Vec<ScheduledTask> = {
            let mut pending = recover(self.pending.lock());
            pending.retain(|t| !t.gate().is_closed());
            // tasks of a plugin still being enabled wait, even when due
            let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut *pending)
                .into_iter()
                .partition(|t| t.gate().is_open() && t.is_due(now));
            *pending = waiting;
            due
        };

        due.into_iter()
            .map(|task| {
                let action = task.action();
                tracing::trace!(parent: &self.span, task = %task.id(), plugin = %task.owner(), "executing task");
                let boundary = Boundary::Task {
                    task: action.describe(),
                    plugin: task.owner().clone(),
                };
                spawn_isolated(boundary, self.span.clone(), async move { action.execute().await })
            })
            .collect()
    }

    /// Start the poll loop
    pub fn start(self: &Arc<Self>) {
        let mut timer = recover(self.timer_handle.lock());
        if timer.is_some() {
            return;
        }

        let scheduler = Arc::clone(self);
        *timer = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(scheduler.tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                let now = interval.tick().await;
                scheduler.poll_once(now);
            }
        }));
        tracing::info!(parent: &self.span, tick_ms = self.tick.as_millis() as u64, "scheduler started");
    }

    /// Stop the poll loop. Pending tasks stay pending.
    pub fn stop(&self) {
        if let Some(handle) = recover(self.timer_handle.lock()).take() {
            handle.abort();
            tracing::info!(parent: &self.span, "scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        recover(self.timer_handle.lock()).is_some()
    }
}
