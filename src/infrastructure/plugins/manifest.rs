//! Plugin manifest definition

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::errors::PluginError;

pub const MANIFEST_FILE: &str = "plugin.yaml";

/// Plugin metadata read from `plugin.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginManifest {
    pub name: String,

    pub version: String,

    pub developer: String,

    pub description: Option<String>,

    /// Key into the compiled-in plugin registry; defaults to `name`
    pub module_name: String,

    /// Entry point inside the module
    pub main_path: String,

    /// Names of plugins that must be enabled first
    pub dependencies: Vec<String>,

    /// Directory the manifest was read from
    #[serde(skip)]
    pub path: PathBuf,
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            name: "Unnamed Plugin".to_string(),
            version: "0.0.0".to_string(),
            developer: "Unspecified Developer".to_string(),
            description: None,
            module_name: String::new(),
            main_path: "main".to_string(),
            dependencies: Vec::new(),
            path: PathBuf::new(),
        }
    }
}

impl PluginManifest {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            module_name: name.clone(),
            name,
            ..Self::default()
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_module(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = module_name.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Parse manifest text belonging to the plugin directory `dir`
    pub fn from_yaml(content: &str, dir: &Path) -> Result<Self, PluginError> {
        let mut manifest: PluginManifest = if content.trim().is_empty() {
            PluginManifest::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| PluginError::Manifest {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?
        };

        if manifest.name.trim().is_empty() {
            return Err(PluginError::Manifest {
                path: dir.display().to_string(),
                reason: "name is empty".to_string(),
            });
        }
        if manifest.module_name.is_empty() {
            manifest.module_name = manifest.name.clone();
        }
        manifest.path = dir.to_path_buf();
        Ok(manifest)
    }

    /// Read `plugin.yaml` from a plugin directory
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, PluginError> {
        let dir = dir.as_ref();
        let file = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&file).map_err(|e| PluginError::Manifest {
            path: file.display().to_string(),
            reason: format!("Failed to read manifest: {}", e),
        })?;

        Self::from_yaml(&content, dir)
    }
}
