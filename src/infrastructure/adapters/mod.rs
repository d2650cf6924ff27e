//! Gateway adapters

pub mod console;
pub mod memory;

pub use console::{ConsoleGateway, ConsoleInput};
pub use memory::{MemoryGateway, SentMessage};
