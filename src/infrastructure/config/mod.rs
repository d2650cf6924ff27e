//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub credentials: CredentialsConfig,
    pub blacklist: BlacklistConfig,
    pub commands: CommandsConfig,
    pub plugins: PluginConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub command_prefix: String,
    pub owner_id: String,
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "switchyard".to_string(),
            command_prefix: "!".to_string(),
            owner_id: String::new(),
            log_level: "info".to_string(),
        }
    }
}

/// Credentials are only read by a network gateway adapter
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CredentialsConfig {
    pub token: Option<String>,
}

/// Context (guild) ids whose notifications are dropped before dispatch
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BlacklistConfig {
    pub contexts: Vec<String>,
}

/// What an actor sees when a command's permission check fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DenialPolicy {
    #[default]
    Silent,
    Notice,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CommandsConfig {
    pub denial: DenialPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginConfig {
    pub directory: PathBuf,
    pub auto_enable: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./plugins"),
            auto_enable: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SchedulerConfig {
    pub tick_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick_ms: 1000 }
    }
}

impl SchedulerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.command_prefix.is_empty() {
            return Err(ConfigError::MissingField("bot.command-prefix".to_string()));
        }
        if self.bot.command_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "command prefix {:?} contains whitespace",
                self.bot.command_prefix
            )));
        }
        Ok(())
    }

    /// Check if a context id is blacklisted
    pub fn is_blacklisted(&self, context_id: &str) -> bool {
        self.blacklist.contexts.iter().any(|c| c == context_id)
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        if let Ok(token) = std::env::var("BOT_TOKEN") {
            config.credentials.token = Some(token);
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            if !prefix.is_empty() {
                config.bot.command_prefix = prefix;
            }
        }

        if let Ok(owner) = std::env::var("BOT_OWNER") {
            config.bot.owner_id = owner;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config = Config::from_yaml(
            "bot:\n  command-prefix: \"?\"\nblacklist:\n  contexts: [\"42\"]\ncommands:\n  denial: notice\n",
        )
        .unwrap();
        assert_eq!(config.bot.command_prefix, "?");
        assert_eq!(config.bot.name, "switchyard");
        assert_eq!(config.commands.denial, DenialPolicy::Notice);
        assert!(config.is_blacklisted("42"));
        assert!(!config.is_blacklisted("43"));
        assert_eq!(config.scheduler.tick(), Duration::from_millis(1000));
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let err = Config::from_yaml("bot:\n  command-prefix: \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn default_config_survives_yaml() {
        let yaml = Config::default().to_yaml().unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.plugins.directory, PathBuf::from("./plugins"));
        assert_eq!(parsed.commands.denial, DenialPolicy::Silent);
    }
}
