//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over a single JSON document on disk.  A
//! missing file loads as defaults; anything unparseable is `Corrupted`.
//! Values are validated both ways so an invalid config is never persisted
//! and never handed to the service.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::ConfigPort;
use crate::config::RoasterConfig;
use crate::error::ConfigError;

pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonFileConfig {
    fn load(&self) -> Result<RoasterConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "JsonFileConfig: {} not found, using defaults",
                    self.path.display()
                );
                return Ok(RoasterConfig::default());
            }
            Err(e) => {
                warn!("JsonFileConfig: read {} failed: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };

        let config: RoasterConfig =
            serde_json::from_str(&text).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        info!("JsonFileConfig: loaded {}", self.path.display());
        Ok(config)
    }

    fn save(&self, config: &RoasterConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigError::Corrupted)?;
        fs::write(&self.path, text).map_err(|e| {
            warn!("JsonFileConfig: write {} failed: {}", self.path.display(), e);
            ConfigError::IoError
        })?;
        info!("JsonFileConfig: saved {}", self.path.display());
        Ok(())
    }
}
