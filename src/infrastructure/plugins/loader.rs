//! Plugin loader - discovers plugin manifests in the plugin directory

use std::path::{Path, PathBuf};

use super::manifest::{PluginManifest, MANIFEST_FILE};
use crate::application::errors::PluginError;

/// Result of scanning the plugin directory
#[derive(Debug, Default)]
pub struct Discovery {
    /// Parsed manifests, sorted by directory name
    pub manifests: Vec<PluginManifest>,
    /// Directories whose manifest could not be read or parsed
    pub invalid: Vec<InvalidPlugin>,
}

#[derive(Debug, Clone)]
pub struct InvalidPlugin {
    pub path: PathBuf,
    pub error: PluginError,
}

impl InvalidPlugin {
    /// Name to report for a plugin without a usable manifest
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }
}

/// Plugin loader
pub struct PluginLoader {
    plugin_dir: PathBuf,
}

impl PluginLoader {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
        }
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Scan every immediate sub-directory that holds a `plugin.yaml`.
    ///
    /// A bad manifest is reported in [`Discovery::invalid`] and does not stop the scan.
    pub fn discover(&self) -> Result<Discovery, PluginError> {
        let mut discovery = Discovery::default();

        if !self.plugin_dir.exists() {
            tracing::warn!("Plugin directory does not exist: {}", self.plugin_dir.display());
            return Ok(discovery);
        }

        let entries = std::fs::read_dir(&self.plugin_dir).map_err(|e| PluginError::Manifest {
            path: self.plugin_dir.display().to_string(),
            reason: format!("Failed to read plugin directory: {}", e),
        })?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            // Skip hidden directories
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    continue;
                }
            }

            if path.join(MANIFEST_FILE).is_file() {
                dirs.push(path);
            }
        }
        dirs.sort();

        for path in dirs {
            match PluginManifest::from_dir(&path) {
                Ok(manifest) => {
                    tracing::debug!(plugin = %manifest.name, path = %path.display(), "found plugin manifest");
                    discovery.manifests.push(manifest);
                }
                Err(error) => {
                    tracing::warn!("Failed to load plugin manifest from {}: {}", path.display(), error);
                    discovery.invalid.push(InvalidPlugin { path, error });
                }
            }
        }

        Ok(discovery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_plugin(root: &Path, dir: &str, manifest: &str) {
        let path = root.join(dir);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(MANIFEST_FILE), manifest).unwrap();
    }

    #[test]
    fn discovers_sorted_and_skips_hidden() {
        let tmp = tempfile::tempdir().unwrap();
        write_plugin(tmp.path(), "b_plugin", "name: b\n");
        write_plugin(tmp.path(), "a_plugin", "name: a\ndependencies: [b]\n");
        write_plugin(tmp.path(), ".hidden", "name: hidden\n");
        fs::create_dir_all(tmp.path().join("no_manifest")).unwrap();
        fs::write(tmp.path().join("stray.yaml"), "name: stray\n").unwrap();

        let discovery = PluginLoader::new(tmp.path()).discover().unwrap();
        let names: Vec<_> = discovery.manifests.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(discovery.manifests[0].path, tmp.path().join("a_plugin"));
        assert!(discovery.invalid.is_empty());
    }

    #[test]
    fn malformed_manifest_does_not_stop_others() {
        let tmp = tempfile::tempdir().unwrap();
        write_plugin(tmp.path(), "good", "name: good\n");
        write_plugin(tmp.path(), "broken", "name: [unclosed\n");

        let discovery = PluginLoader::new(tmp.path()).discover().unwrap();
        assert_eq!(discovery.manifests.len(), 1);
        assert_eq!(discovery.invalid.len(), 1);
        assert_eq!(discovery.invalid[0].display_name(), "broken");
    }

    #[test]
    fn missing_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let discovery = PluginLoader::new(tmp.path().join("nope")).discover().unwrap();
        assert!(discovery.manifests.is_empty());
    }
}
