//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Plugins: Manifest discovery and the compiled-in plugin registry
//! - Storage: Data persistence
//! - Adapters: Gateway implementations (console, in-memory)

pub mod adapters;
pub mod config;
pub mod plugins;
pub mod storage;
