use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,
    /// the path to our blobs store, if not set then
    ///  an in-memory store will be used
    pub blobs_path: Option<PathBuf>,

    // misc
    pub log_level: String,

    /// protocol parameters shared with every other client
    pub protocol: common::config::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sqlite_path: None,
            blobs_path: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            protocol: common::config::Config::default(),
        }
    }
}

impl Config {
    /// Load from a TOML file. Keys missing from the file take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }
        let config_toml = fs::read_to_string(path)?;
        Self::from_toml_str(&config_toml)
    }

    pub fn from_toml_str(config_toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(config_toml)?;
        config.log_level()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        tracing::Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing config file: {0}")]
    MissingFile(PathBuf),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
