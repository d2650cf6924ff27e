//! switchyard - a plugin-hosted chat bot runtime
//!
//! A gateway adapter feeds notifications into a typed event bus; plugins,
//! enabled in dependency order, react through handlers, prefixed commands and
//! scheduled tasks.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;

pub use application::errors::{BotError, HandlerResult};
pub use application::{Bot, RuntimeContext};
pub use infrastructure::config::Config;
