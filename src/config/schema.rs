//! Configuration schema for Depot
//!
//! Configuration is stored at `~/.config/depot/config.toml`

use crate::config::ConfigManager;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Content storage
    pub storage: StorageConfig,

    /// Store definitions
    pub catalog: CatalogConfig,

    /// Content index
    pub index: IndexConfig,

    /// Not-found cache
    pub nfc: NfcConfig,
}

impl Config {
    /// Directory content is stored under
    pub fn storage_root(&self) -> PathBuf {
        self.storage
            .root
            .clone()
            .unwrap_or_else(|| ConfigManager::data_dir().join("storage"))
    }

    /// Directory store definitions are loaded from
    pub fn catalog_dir(&self) -> PathBuf {
        self.catalog
            .dir
            .clone()
            .unwrap_or_else(|| ConfigManager::data_dir().join("stores"))
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Content storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage root (default: `<data dir>/storage`)
    pub root: Option<PathBuf>,
}

/// Store catalog settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory of `<type>/<name>.json` definitions (default: `<data dir>/stores`)
    pub dir: Option<PathBuf>,
}

/// Content index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Consult the content index (default: true)
    pub enabled: bool,

    /// Maximum number of indexed paths
    pub max_entries: u64,

    /// Drop entries not read for N seconds (0 = never)
    pub idle_secs: u64,
}

impl IndexConfig {
    pub fn idle(&self) -> Option<Duration> {
        (self.idle_secs > 0).then(|| Duration::from_secs(self.idle_secs))
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 100_000,
            idle_secs: 0,
        }
    }
}

/// Not-found cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NfcConfig {
    /// Remember missing paths (default: true)
    pub enabled: bool,

    /// Seconds a missing path is remembered
    pub ttl_secs: u64,

    /// Maximum number of remembered paths
    pub max_entries: u64,
}

impl NfcConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for NfcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
            max_entries: 100_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[index]"));
        assert!(toml.contains("[nfc]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.index.enabled);
        assert_eq!(config.nfc.ttl(), Duration::from_secs(300));
        assert!(config.index.idle().is_none());
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [storage]
            root = "/srv/depot"

            [nfc]
            enabled = false
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage_root(), PathBuf::from("/srv/depot"));
        assert!(!config.nfc.enabled);
        assert_eq!(config.nfc.max_entries, 100_000); // default preserved
        assert!(config.catalog_dir().ends_with("stores"));
    }
}
