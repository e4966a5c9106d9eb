use lessonbook_core::RemoteConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite cache database
    pub database_path: PathBuf,
    /// Active class identifier
    pub class: String,
    /// Remote mirror; absent base_url disables it
    pub remote: RemoteConfig,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: home.join(".lessonbook").join("lessonbook.db"),
            class: "LKG".to_string(),
            remote: RemoteConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        if let Ok(db_path) = std::env::var("LESSONBOOK_DATABASE_PATH") {
            config.database_path = PathBuf::from(db_path);
        }
        if let Ok(class) = std::env::var("LESSONBOOK_CLASS") {
            config.class = class;
        }
        if let Ok(url) = std::env::var("LESSONBOOK_REMOTE_URL") {
            config.remote.base_url = Some(url);
        }
        if let Ok(key) = std::env::var("LESSONBOOK_REMOTE_KEY") {
            config.remote.api_key = Some(key);
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/lessonbook/config.yaml
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("lessonbook").join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
