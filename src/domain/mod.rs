//! Domain layer - Core business objects with no runtime behavior
//! 
//! This layer contains:
//! - Entities: actors, messages, typed events
//! - Permission: predicates over an actor
//! - Traits: Abstractions for infrastructure (Gateway, RowStore)

pub mod entities;
pub mod permission;
pub mod traits;

pub use permission::Permission;
