//! Plugin trait definitions

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use super::context::PluginContext;
use crate::application::errors::HandlerResult;

/// Core plugin trait that all plugins must implement.
///
/// `enable` receives the capability object for this activation. Anything it
/// registers through that object is purged when the plugin is disabled.
#[async_trait]
pub trait Plugin: Send + Sync {
    async fn enable(&self, ctx: &PluginContext) -> HandlerResult;

    /// Runs before the plugin's registrations are purged
    async fn disable(&self, _ctx: &PluginContext) -> HandlerResult {
        Ok(())
    }
}

/// Lifecycle state of one plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginState {
    Unloaded,
    Loaded,
    Enabled,
    Disabled,
    Failed,
}

impl PluginState {
    pub fn as_str(&self) -> &str {
        match self {
            PluginState::Unloaded => "unloaded",
            PluginState::Loaded => "loaded",
            PluginState::Enabled => "enabled",
            PluginState::Disabled => "disabled",
            PluginState::Failed => "failed",
        }
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plugin information for listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginSummary {
    pub name: String,
    pub version: String,
    pub developer: String,
    pub description: Option<String>,
    pub dependencies: Vec<String>,
    pub state: PluginState,
    pub reason: Option<String>,
}
