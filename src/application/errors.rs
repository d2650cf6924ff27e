//! Application layer errors

use thiserror::Error;

/// Result type returned by event handlers, command handlers and task actions
pub type HandlerResult<T = ()> = Result<T, BotError>;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Capability of plugin '{0}' was revoked")]
    CapabilityRevoked(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    pub fn internal(msg: impl Into<String>) -> Self {
        BotError::Internal(msg.into())
    }
}

/// Command registration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Command '{name}' is already registered by '{owner}'")]
    Duplicate { name: String, owner: String },

    #[error("Invalid command name: {0:?}")]
    InvalidName(String),
}

/// Plugin loading and lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    #[error("Invalid manifest at {path}: {reason}")]
    Manifest { path: String, reason: String },

    #[error("Duplicate plugin name: {0}")]
    Duplicate(String),

    #[error("Missing dependency '{dependency}' required by '{plugin}'")]
    MissingDependency { plugin: String, dependency: String },

    #[error("Dependency cycle involving {0}")]
    Cycle(String),

    #[error("Dependency group of '{0}' failed to resolve")]
    DependencyGroup(String),

    #[error("Dependency '{0}' is not available")]
    DependencyUnavailable(String),

    #[error("Plugin constructor failed: {0}")]
    Construction(String),

    #[error("No plugin module named '{0}'")]
    UnknownModule(String),

    #[error("Plugin '{name}' cannot {action} while {state}")]
    InvalidState { name: String, action: String, state: String },

    #[error("Plugin not found: {0}")]
    NotFound(String),

    #[error("Plugin hook failed: {0}")]
    Hook(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
