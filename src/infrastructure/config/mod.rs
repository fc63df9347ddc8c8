//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub logging: LoggingConfig,
    pub plugins: PluginConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingConfig {
    pub level: String,
    /// "console" or "json"
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginConfig {
    pub directory: PathBuf,
    /// Extension plugin artifacts must carry, e.g. ".so"
    pub extension: String,
    /// How long shutdown waits after telling every plugin to stop
    pub grace_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "plugbot".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "console".to_string(),
            },
            plugins: PluginConfig {
                directory: PathBuf::from("./plugins"),
                extension: ".so".to_string(),
                grace_seconds: 5,
            },
            adapters: AdaptersConfig {
                telegram: Some(TelegramConfig {
                    enabled: false,
                    token: None,
                }),
                console: Some(ConsoleConfig { enabled: true }),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.into())?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.logging.format.as_str(), "console" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                value: self.logging.format.clone(),
            });
        }
        Ok(())
    }

    /// Apply environment overrides on top of the loaded values.
    pub fn load_env(mut self) -> Self {
        if let Ok(token) = std::env::var("PLUGBOT_TELEGRAM_TOKEN") {
            self.adapters.telegram = Some(TelegramConfig {
                enabled: true,
                token: Some(token),
            });
        }
        if let Ok(level) = std::env::var("PLUGBOT_LOG") {
            self.logging.level = level;
        }
        self
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.plugins.grace_seconds)
    }
}
