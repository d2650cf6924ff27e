//! Plugin discovery for switchyard
//!
//! Plugins are compiled into the binary and registered by module name. Each
//! plugin directory carries a `plugin.yaml` manifest that names its module and
//! dependencies.

pub mod loader;
pub mod manifest;
pub mod registry;

pub use loader::{Discovery, InvalidPlugin, PluginLoader};
pub use manifest::{PluginManifest, MANIFEST_FILE};
pub use registry::{PluginFactory, PluginRegistry};
