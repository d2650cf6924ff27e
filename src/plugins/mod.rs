//! Plugin system for switchyard
//!
//! Plugins are enabled in dependency order and receive a revocable
//! [`PluginContext`] for registering handlers, commands and tasks.

pub mod bundled;
pub mod context;
pub mod graph;
pub mod manager;
pub mod trait_def;

pub use context::{PluginContext, PluginDirectory, Services};
pub use manager::PluginRuntime;
pub use trait_def::{Plugin, PluginState, PluginSummary};
