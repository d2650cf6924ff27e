//! Runtime context handed to every component constructor

use std::sync::Arc;
use tracing::Span;

use crate::infrastructure::config::Config;

/// Shared configuration plus the root logging span.
///
/// Components take this explicitly instead of reaching for global state, and
/// open their own span as a child of [`RuntimeContext::span`].
#[derive(Clone)]
pub struct RuntimeContext {
    config: Arc<Config>,
    span: Span,
}

impl RuntimeContext {
    pub fn new(config: Config) -> Self {
        let span = tracing::info_span!("runtime", bot = %config.bot.name);
        Self {
            config: Arc::new(config),
            span,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Child span for one component of the runtime
    pub fn component_span(&self, component: &'static str) -> Span {
        tracing::debug_span!(parent: &self.span, "component", name = component)
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
