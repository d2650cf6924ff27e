use std::fmt;

/// Identifies the owner of a registration: a plugin name, or the runtime itself
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(String);

impl PluginId {
    const RUNTIME: &'static str = "@runtime";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Owner of the runtime's own registrations; never disabled
    pub fn runtime() -> Self {
        Self(Self::RUNTIME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
