//! Error types for Depot
//!
//! All modules use `DepotResult<T>` as their return type.

use crate::store::StoreKey;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Depot operations
pub type DepotResult<T> = Result<T, DepotError>;

/// All errors that can occur in Depot
#[derive(Error, Debug)]
pub enum DepotError {
    // Catalog errors
    #[error("Store not found: {0}")]
    StoreNotFound(StoreKey),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Invalid store key '{0}': expected <hosted|remote|group>:<name>")]
    InvalidStoreKey(String),

    #[error("Invalid store definition at {path}: {reason}")]
    CatalogInvalid { path: PathBuf, reason: String },

    // Transport errors
    #[error("Cannot reach location {location}: {reason}")]
    Location { location: String, reason: String },

    #[error("Transfer failed for {key}:{path}: {reason}")]
    TransferFailed {
        key: StoreKey,
        path: String,
        reason: String,
    },

    // Storage errors
    #[error("Store {0} does not accept uploads")]
    NotWritable(StoreKey),

    #[error("No store eligible to hold {path} (candidates: {candidates})")]
    NoStorageTarget { path: String, candidates: String },

    #[error("Invalid path: {path}: {reason}")]
    PathInvalid { path: String, reason: String },

    // Cache errors
    #[error("Cache backend unavailable: {0}")]
    CacheBackend(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl DepotError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a location error
    pub fn location(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Location {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from reaching a store's physical location.
    ///
    /// Location errors mean "this store could not answer", never "the
    /// request was invalid", so group traversal treats them as a miss.
    pub fn is_location_error(&self) -> bool {
        matches!(self, Self::Location { .. } | Self::TransferFailed { .. })
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Location { .. } | Self::TransferFailed { .. } | Self::CacheBackend(_)
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::StoreNotFound(_) | Self::GroupNotFound(_) => {
                Some("Run: depot stores (to list known store definitions)")
            }
            Self::InvalidStoreKey(_) => Some("Store keys look like: group:public, hosted:local"),
            Self::NotWritable(_) => Some("Upload into a hosted repository or a group containing one"),
            Self::ConfigInvalid { .. } => Some("Run: depot config show"),
            _ => None,
        }
    }
}
