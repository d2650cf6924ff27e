//! Deferred and repeating work

pub mod service;
pub mod task;

pub use service::Scheduler;
pub use task::{Repeating, ScheduledTask, SendMessage, SetPresence, TaskAction, TaskSink};
