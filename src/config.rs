use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::executor::DEFAULT_WORKERS;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Number of background workers that perform database writes
    pub write_workers: ConfigValue<usize>,
    /// Where the logged-in user is remembered between commands
    pub session_path: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    write_workers: Option<usize>,
    session_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let data_dir = Self::default_data_dir();

        let mut database_path =
            ConfigValue::new(data_dir.join("dietary.db"), ConfigSource::Default);
        let mut write_workers = ConfigValue::new(DEFAULT_WORKERS, ConfigSource::Default);
        let mut session_path = ConfigValue::new(data_dir.join("session.yaml"), ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                database_path = ConfigValue::new(resolve(&path, db_path), ConfigSource::File);
            }
            if let Some(workers) = file_config.write_workers {
                write_workers = ConfigValue::new(workers, ConfigSource::File);
            }
            if let Some(session) = file_config.session_path {
                session_path = ConfigValue::new(resolve(&path, session), ConfigSource::File);
            }
        }

        if let Ok(db_path) = std::env::var("DIETARY_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(workers) = std::env::var("DIETARY_WRITE_WORKERS") {
            let parsed = workers.trim().parse().map_err(|_| {
                ConfigError::InvalidValue("DIETARY_WRITE_WORKERS".to_string(), workers.clone())
            })?;
            write_workers = ConfigValue::new(parsed, ConfigSource::Environment);
        }
        if let Ok(session) = std::env::var("DIETARY_SESSION_PATH") {
            session_path = ConfigValue::new(PathBuf::from(session), ConfigSource::Environment);
        }

        // The session lives next to the database unless placed explicitly
        if session_path.source == ConfigSource::Default {
            if let Some(dir) = database_path.value.parent() {
                session_path.value = dir.join("session.yaml");
            }
        }

        if write_workers.value == 0 {
            return Err(ConfigError::InvalidValue(
                "write_workers".to_string(),
                "0".to_string(),
            ));
        }

        Ok(Self {
            database_path,
            write_workers,
            session_path,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/dietary/
    /// - macOS: ~/Library/Application Support/dietary/
    /// - Windows: %APPDATA%/dietary/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dietary")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }

    /// Default data directory, e.g. ~/.local/share/dietary/ on Linux
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dietary")
    }
}

/// Relative paths in the config file are relative to the file itself.
fn resolve(config_file: &Path, value: PathBuf) -> PathBuf {
    if value.is_relative() {
        config_file
            .parent()
            .map(|p| p.join(&value))
            .unwrap_or(value)
    } else {
        value
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    e
                )
            }
            ConfigError::InvalidValue(key, value) => {
                write!(f, "Invalid value '{}' for {}", value, key)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
