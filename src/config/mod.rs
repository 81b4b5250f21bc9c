//! Configuration management for precache

pub mod schema;

pub use schema::Config;

use crate::error::{PrecacheError, PrecacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File name looked up in the site root
pub const CONFIG_FILE_NAME: &str = "precache.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Config manager for the default file inside a site root
    pub fn for_root(root: &Path) -> Self {
        Self {
            config_path: root.join(CONFIG_FILE_NAME),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> PrecacheResult<Config> {
        if !self.config_path.exists() {
            debug!(
                "Config file {} not found, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> PrecacheResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PrecacheError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| PrecacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if config.assets.is_empty() {
            return Err(PrecacheError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: "at least one tracked asset is required".to_string(),
            });
        }

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
