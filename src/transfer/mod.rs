//! Physical content transfer
//!
//! A [`Transfer`] is a handle to one path at one store's location. It may
//! point at content that no longer exists; `exists()` is the only authority
//! on that, and the content index relies on it to detect stale entries.

pub mod fs;

pub use self::fs::FileTransferManager;

use crate::error::{DepotError, DepotResult};
use crate::store::{ArtifactStore, ConcreteResource, Location, StoreKey};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// What a transfer reference will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOperation {
    Download,
    Upload,
    Listing,
}

/// Handle to content at a store's physical location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    resource: ConcreteResource,
    file: PathBuf,
}

impl Transfer {
    pub fn new(resource: ConcreteResource, file: PathBuf) -> Self {
        Self { resource, file }
    }

    pub fn resource(&self) -> &ConcreteResource {
        &self.resource
    }

    pub fn location(&self) -> &Location {
        self.resource.location()
    }

    /// Key of the store this content physically belongs to
    pub fn store_key(&self) -> &StoreKey {
        self.resource.location().key()
    }

    pub fn path(&self) -> &str {
        self.resource.path()
    }

    /// Backing file
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Whether the content is currently present
    pub async fn exists(&self) -> bool {
        tokio::fs::metadata(&self.file)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Whether the reference points at an existing directory
    pub async fn is_dir(&self) -> bool {
        tokio::fs::metadata(&self.file)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Open the content for reading
    pub async fn open(&self) -> DepotResult<tokio::fs::File> {
        tokio::fs::File::open(&self.file)
            .await
            .map_err(|e| DepotError::io(format!("opening {}", self), e))
    }

    /// Read the whole content
    pub async fn read(&self) -> DepotResult<Vec<u8>> {
        let mut file = self.open().await?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .await
            .map_err(|e| DepotError::io(format!("reading {}", self), e))?;
        Ok(buf)
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)
    }
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreResource {
    pub key: StoreKey,
    pub path: String,
    pub is_dir: bool,
}

impl StoreResource {
    pub fn file(key: StoreKey, path: impl Into<String>) -> Self {
        Self {
            key,
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(key: StoreKey, path: impl Into<String>) -> Self {
        Self {
            key,
            path: path.into(),
            is_dir: true,
        }
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.path)
    }
}

/// Join a directory path and an entry name with a single separator
pub fn child_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Physical storage and transport of store content
#[async_trait]
pub trait TransferManager: Send + Sync {
    /// Fetch content, pulling it from upstream for remote stores
    async fn retrieve(&self, store: &ArtifactStore, path: &str) -> DepotResult<Option<Transfer>>;

    /// Write content into the store's location
    async fn store(&self, store: &ArtifactStore, path: &str, content: &[u8])
        -> DepotResult<Transfer>;

    /// Remove content, returning whether anything was removed
    async fn delete(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool>;

    /// List a directory
    async fn list(&self, store: &ArtifactStore, path: &str) -> DepotResult<Vec<StoreResource>>;

    /// Check for content without transferring it
    async fn exists(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool>;

    /// Reference to where content for `path` lives or would live
    fn storage_reference(&self, store: &ArtifactStore, path: &str) -> DepotResult<Transfer>;
}
