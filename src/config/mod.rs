//! Configuration management for sootcache

pub mod schema;

pub use schema::Config;

use crate::error::{SootError, SootResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sootcache")
            .join("config.toml")
    }

    /// Get the default state directory path
    pub fn default_state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sootcache")
    }

    /// Load configuration, falling back to defaults if the file does not exist
    ///
    /// Sections and keys left out of the file keep their default values.
    pub async fn load(&self) -> SootResult<Config> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", self.config_path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(SootError::io(
                    format!("reading config from {}", self.config_path.display()),
                    e,
                ))
            }
        };

        toml::from_str(&content).map_err(|e| SootError::ConfigInvalid {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write configuration, creating the parent directory first
    pub async fn save(&self, config: &Config) -> SootResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SootError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            SootError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
