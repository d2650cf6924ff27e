//! Domain traits - Abstractions for infrastructure implementations

pub mod gateway;
pub mod store;

pub use gateway::{BotInfo, Gateway};
pub use store::{Row, RowStore};
