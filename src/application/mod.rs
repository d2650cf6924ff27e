//! Application layer - the event runtime
//!
//! This layer contains:
//! - Events: typed bus and gateway fan-out
//! - Commands: tokenizer and permission-gated router
//! - Scheduler: deferred and repeating tasks
//! - Bot: wiring of the above
//! - Errors: runtime error types

pub mod bot;
pub mod commands;
pub mod context;
pub mod errors;
pub mod events;
pub mod gate;
pub mod isolation;
pub mod scheduler;

pub use bot::Bot;
pub use context::RuntimeContext;
pub use gate::Gate;
