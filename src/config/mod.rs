//! Configuration management for Depot

pub mod schema;

pub use schema::Config;

use crate::error::{DepotError, DepotResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Locates, reads, and writes the depot config file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Manager for an explicit `--config` path, or the per-user default
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        match explicit {
            Some(path) => Self::with_path(path),
            None => Self::new(),
        }
    }

    /// `<config dir>/depot/config.toml`
    pub fn default_config_path() -> PathBuf {
        user_dir(dirs::config_dir()).join("config.toml")
    }

    /// `<local data dir>/depot`, parent of the default storage and catalog
    pub fn data_dir() -> PathBuf {
        user_dir(dirs::data_local_dir())
    }

    /// Read the config file. A missing file yields the defaults.
    pub async fn load(&self) -> DepotResult<Config> {
        match self.load_from_file(&self.config_path).await {
            Err(DepotError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", self.config_path.display());
                Ok(Config::default())
            }
            other => other,
        }
    }

    pub async fn load_from_file(&self, path: &Path) -> DepotResult<Config> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| DepotError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config = toml::from_str(&raw).map_err(|e| DepotError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write `config` to the managed path, creating its directory
    pub async fn save(&self, config: &Config) -> DepotResult<()> {
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| DepotError::ConfigDirCreate {
                    path: dir.to_path_buf(),
                    source: e,
                })?;
        }

        let rendered = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, rendered).await.map_err(|e| {
            DepotError::io(format!("writing config to {}", self.config_path.display()), e)
        })?;

        info!("Wrote config to {}", self.config_path.display());
        Ok(())
    }

    /// Create the storage root and catalog directory named by `config`
    pub async fn ensure_data_dirs(config: &Config) -> DepotResult<()> {
        for dir in [config.storage_root(), config.catalog_dir()] {
            fs::create_dir_all(&dir).await.map_err(|e| {
                DepotError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn user_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join("depot")
}
