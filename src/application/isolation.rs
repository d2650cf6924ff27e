//! Failure isolation for plugin-supplied futures.
//!
//! Handlers, commands and scheduled tasks all run as their own tokio task.
//! An `Err` or a panic inside one is logged with its owner and never reaches
//! the caller that launched it.

use std::future::Future;
use std::sync::{LockResult, PoisonError};
use tokio::task::JoinHandle;
use tracing::{Instrument, Span};

use crate::application::errors::HandlerResult;
use crate::domain::entities::{EventType, PluginId};

/// Where a failure was contained, used as structured log context
#[derive(Debug, Clone)]
pub enum Boundary {
    Handler { event_type: EventType, plugin: PluginId },
    Command { command: String, plugin: PluginId },
    Task { task: String, plugin: PluginId },
}

impl Boundary {
    fn report(&self, failure: &str) {
        match self {
            Boundary::Handler { event_type, plugin } => {
                tracing::error!(%event_type, %plugin, "event handler failed: {}", failure);
            }
            Boundary::Command { command, plugin } => {
                tracing::error!(%command, %plugin, "command handler failed: {}", failure);
            }
            Boundary::Task { task, plugin } => {
                tracing::error!(%task, %plugin, "scheduled task failed: {}", failure);
            }
        }
    }
}

/// Run `fut` as an independent task; resolves to `None` when it failed.
pub fn spawn_isolated<T, F>(boundary: Boundary, span: Span, fut: F) -> JoinHandle<Option<T>>
where
    T: Send + 'static,
    F: Future<Output = HandlerResult<T>> + Send + 'static,
{
    let inner = tokio::spawn(fut.instrument(span.clone()));
    tokio::spawn(
        async move {
            match inner.await {
                Ok(Ok(value)) => Some(value),
                Ok(Err(e)) => {
                    boundary.report(&e.to_string());
                    None
                }
                Err(join) if join.is_panic() => {
                    boundary.report("panicked");
                    None
                }
                Err(_) => {
                    boundary.report("cancelled");
                    None
                }
            }
        }
        .instrument(span),
    )
}

/// Registries never hold a lock across plugin code, so a poisoned lock
/// still guards consistent data.
pub(crate) fn recover<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(PoisonError::into_inner)
}
