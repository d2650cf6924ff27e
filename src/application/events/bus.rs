//! Event bus - typed publish/subscribe registry and dispatcher

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::Span;

use crate::application::context::RuntimeContext;
use crate::application::errors::HandlerResult;
use crate::application::gate::Gate;
use crate::application::isolation::{recover, spawn_isolated, Boundary};
use crate::domain::entities::{Event, EventType, PluginId};

/// Reacts to one event type
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: Arc<Event>) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> EventHandler for F
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, event: Arc<Event>) -> HandlerResult {
        (self)(event).await
    }
}

/// One handler registered for one event type
#[derive(Clone)]
pub struct HandlerRegistration {
    id: u64,
    owner: PluginId,
    gate: Gate,
    handler: Arc<dyn EventHandler>,
}

impl HandlerRegistration {
    pub fn owner(&self) -> &PluginId {
        &self.owner
    }
}

/// Revocable handle returned by [`EventBus::register`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerHandle {
    id: u64,
    event_type: EventType,
}

impl HandlerHandle {
    pub fn event_type(&self) -> EventType {
        self.event_type
    }
}

pub struct EventBus {
    handlers: RwLock<HashMap<EventType, Vec<HandlerRegistration>>>,
    next_id: AtomicU64,
    span: Span,
}

impl EventBus {
    pub fn new(ctx: &RuntimeContext) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            span: ctx.component_span("event_bus"),
        }
    }

    /// Append a handler for `event_type`
    pub fn register<H>(&self, event_type: EventType, handler: H, owner: PluginId) -> HandlerHandle
    where
        H: EventHandler + 'static,
    {
        self.register_gated(event_type, handler, owner, Gate::always())
    }

    /// Append a handler that is dispatched only while `gate` is open
    pub fn register_gated<H>(&self, event_type: EventType, handler: H, owner: PluginId, gate: Gate) -> HandlerHandle
    where
        H: EventHandler + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(parent: &self.span, %event_type, plugin = %owner, id, "registering handler");

        recover(self.handlers.write())
            .entry(event_type)
            .or_default()
            .push(HandlerRegistration {
                id,
                owner,
                gate,
                handler: Arc::new(handler),
            });

        HandlerHandle { id, event_type }
    }

    /// Remove a single registration; false if it was already gone
    pub fn unregister(&self, handle: &HandlerHandle) -> bool {
        let mut handlers = recover(self.handlers.write());
        let Some(list) = handlers.get_mut(&handle.event_type) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != handle.id);
        before != list.len()
    }

    /// Remove every registration owned by `owner`, across all event types
    pub fn unregister_all(&self, owner: &PluginId) -> usize {
        let mut handlers = recover(self.handlers.write());
        let mut removed = 0;
        for list in handlers.values_mut() {
            let before = list.len();
            list.retain(|r| r.owner != *owner);
            removed += before - list.len();
        }
        handlers.retain(|_, list| !list.is_empty());

        if removed > 0 {
            tracing::debug!(parent: &self.span, plugin = %owner, removed, "unregistered handlers");
        }
        removed
    }

    /// Point-in-time copy of the open handlers for `event_type`, in registration order
    pub fn snapshot(&self, event_type: EventType) -> Vec<HandlerRegistration> {
        recover(self.handlers.read())
            .get(&event_type)
            .map(|list| list.iter().filter(|r| r.gate.is_open()).cloned().collect())
            .unwrap_or_default()
    }

    pub fn handler_count(&self, event_type: EventType) -> usize {
        recover(self.handlers.read())
            .get(&event_type)
            .map_or(0, Vec::len)
    }

    /// Launch every handler registered for the event's type.
    ///
    /// Handlers run concurrently over a snapshot taken before the first one
    /// starts, so registrations they make apply to later dispatches only.
    /// A failing handler is logged and does not affect its siblings.
    pub fn dispatch(&self, event: Event) -> Dispatch {
        let event_type = event.event_type();
        let snapshot = self.snapshot(event_type);
        let event = Arc::new(event);

        tracing::trace!(parent: &self.span, %event_type, handlers = snapshot.len(), "dispatching");

        let mut owners = Vec::with_capacity(snapshot.len());
        let mut handles = Vec::with_capacity(snapshot.len());
        for registration in snapshot {
            let boundary = Boundary::Handler {
                event_type,
                plugin: registration.owner.clone(),
            };
            let handler = Arc::clone(&registration.handler);
            let event = Arc::clone(&event);
            handles.push(spawn_isolated(boundary, self.span.clone(), async move {
                handler.handle(event).await
            }));
            owners.push(registration.owner);
        }

        Dispatch {
            event_type,
            owners,
            handles,
        }
    }
}

/// Handlers launched by one [`EventBus::dispatch`] call
pub struct Dispatch {
    event_type: EventType,
    owners: Vec<PluginId>,
    handles: Vec<JoinHandle<Option<()>>>,
}

impl Dispatch {
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Owners of the invoked handlers, in snapshot order
    pub fn owners(&self) -> &[PluginId] {
        &self.owners
    }

    pub fn handler_count(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every launched handler to finish
    pub async fn finished(self) -> DispatchReport {
        let mut report = DispatchReport::default();
        for handle in self.handles {
            match handle.await {
                Ok(Some(())) => report.succeeded += 1,
                _ => report.failed += 1,
            }
        }
        report
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::BotError;
    use std::sync::atomic::AtomicUsize;

    fn counter_handler(counter: Arc<AtomicUsize>) -> impl EventHandler {
        move |_event: Arc<Event>| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), BotError>(())
            }
        }
    }

    async fn fail(_event: Arc<Event>) -> HandlerResult {
        Err(BotError::internal("boom"))
    }

    async fn explode(_event: Arc<Event>) -> HandlerResult {
        panic!("handler panic")
    }

    #[tokio::test]
    async fn dispatch_invokes_only_matching_type() {
        let bus = EventBus::new(&RuntimeContext::default());
        let hits = Arc::new(AtomicUsize::new(0));
        bus.register(EventType::Ready, counter_handler(hits.clone()), "a".into());
        bus.register(EventType::GuildLeft, counter_handler(hits.clone()), "a".into());

        let report = bus.dispatch(Event::Ready).finished().await;
        assert_eq!(report, DispatchReport { succeeded: 1, failed: 0 });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_handler_does_not_stop_siblings() {
        let bus = EventBus::new(&RuntimeContext::default());
        let hits = Arc::new(AtomicUsize::new(0));
        bus.register(EventType::Ready, fail, "bad".into());
        bus.register(EventType::Ready, explode, "worse".into());
        bus.register(EventType::Ready, counter_handler(hits.clone()), "good".into());

        let report = bus.dispatch(Event::Ready).finished().await;
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gated_handlers_run_only_while_open() {
        let bus = EventBus::new(&RuntimeContext::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let gate = Gate::pending();
        bus.register_gated(EventType::Ready, counter_handler(hits.clone()), "p".into(), gate.clone());

        assert_eq!(bus.handler_count(EventType::Ready), 1);
        assert!(bus.dispatch(Event::Ready).owners().is_empty());

        gate.open();
        bus.dispatch(Event::Ready).finished().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        gate.close();
        assert_eq!(bus.dispatch(Event::Ready).handler_count(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unregister_all_touches_only_one_owner() {
        let bus = EventBus::new(&RuntimeContext::default());
        let hits = Arc::new(AtomicUsize::new(0));
        for ty in [EventType::Ready, EventType::MessageSent, EventType::GuildJoined] {
            bus.register(ty, counter_handler(hits.clone()), "p".into());
            bus.register(ty, counter_handler(hits.clone()), "q".into());
        }

        assert_eq!(bus.unregister_all(&"p".into()), 3);
        for ty in [EventType::Ready, EventType::MessageSent, EventType::GuildJoined] {
            let owners: Vec<_> = bus.snapshot(ty).iter().map(|r| r.owner().clone()).collect();
            assert_eq!(owners, vec![PluginId::from("q")]);
        }
        assert_eq!(bus.unregister_all(&"p".into()), 0);
    }

    #[tokio::test]
    async fn handle_revokes_single_registration() {
        let bus = EventBus::new(&RuntimeContext::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let first = bus.register(EventType::Ready, counter_handler(hits.clone()), "p".into());
        bus.register(EventType::Ready, counter_handler(hits.clone()), "p".into());

        assert!(bus.unregister(&first));
        assert!(!bus.unregister(&first));
        assert_eq!(bus.handler_count(EventType::Ready), 1);
    }

    #[tokio::test]
    async fn registrations_made_during_dispatch_wait_for_the_next_one() {
        let bus = Arc::new(EventBus::new(&RuntimeContext::default()));
        let hits = Arc::new(AtomicUsize::new(0));

        let registering_bus = Arc::clone(&bus);
        let late_hits = hits.clone();
        bus.register(
            EventType::Ready,
            move |_e: Arc<Event>| {
                let bus = Arc::clone(&registering_bus);
                let hits = late_hits.clone();
                async move {
                    bus.register(EventType::Ready, counter_handler(hits), "late".into());
                    Ok::<(), BotError>(())
                }
            },
            "registrar".into(),
        );

        let first = bus.dispatch(Event::Ready);
        assert_eq!(first.owners(), &[PluginId::from("registrar")]);
        first.finished().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let second = bus.dispatch(Event::Ready);
        assert_eq!(second.handler_count(), 2);
        second.finished().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
