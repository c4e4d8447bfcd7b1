//! Errors raised while reading `.opsdesk/config.toml` or checking its values.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not valid TOML: {source}", path.display())]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A value parsed fine but is unusable, e.g. a non-HTTP API URL or a
    /// zero poll interval. `key` is the dotted kebab-case setting name.
    #[error("invalid value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
