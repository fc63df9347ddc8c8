//! Application layer errors

use thiserror::Error;

use crate::domain::entities::ParameterKind;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Plugin loading and supervision errors.
///
/// `Load` is recoverable: the candidate artifact is logged and skipped.
/// `Contract` is a programming error in a loadable artifact and aborts the
/// whole load phase, as does an unreadable plugin directory.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("failed to read plugin directory {dir}: {source}")]
    Directory {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load plugin {file}: {reason}")]
    Load { file: String, reason: String },

    #[error("plugin {file} violates the plugin contract: {reason}")]
    Contract { file: String, reason: String },
}

/// Argument extraction errors. Any of these fails the whole parse for the
/// matched command; no partial argument map is ever produced.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("keyword '{0}' not found when parsing arguments")]
    MissingKeyword(String),

    #[error("no value found for parameter '{keyword}' ({kind})")]
    NoValue { keyword: String, kind: ParameterKind },

    #[error("bad extraction pattern for parameter '{keyword}': {reason}")]
    Pattern { keyword: String, reason: String },

    #[error("match for parameter '{0}' produced no capture group")]
    InvariantViolation(String),
}

/// Routing errors. Every variant resolves to exactly one failure reply sent
/// back to the originating channel.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("no command found")]
    NoCommand,

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Top-level runtime errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("network error: {0}")]
    Network(String),
}
