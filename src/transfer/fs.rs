//! Filesystem transfer manager
//!
//! Content lives at `{root}/{type}/{name}/{path}`. Remote stores keep a
//! local copy of what they proxied; on a local miss they pull from their
//! upstream. Only `file://` upstreams have a transport here, every other
//! scheme fails as a location error.

use crate::error::{DepotError, DepotResult};
use crate::store::{ArtifactStore, ConcreteResource, StoreKey};
use crate::transfer::{child_path, StoreResource, Transfer, TransferManager};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, trace};

const FILE_SCHEME: &str = "file://";

/// Transfer manager storing content in a local directory tree
#[derive(Debug)]
pub struct FileTransferManager {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FileTransferManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tmp_counter: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, key: &StoreKey) -> PathBuf {
        self.root.join(key.store_type().as_str()).join(key.name())
    }

    fn file_for(&self, key: &StoreKey, path: &str) -> DepotResult<PathBuf> {
        let relative = validate_path(path)?;
        Ok(self.store_dir(key).join(relative))
    }

    fn transfer(&self, store: &ArtifactStore, path: &str) -> DepotResult<Transfer> {
        let file = self.file_for(&store.key(), path)?;
        Ok(Transfer::new(ConcreteResource::of(store, path), file))
    }

    /// Upstream file for a remote store, if the store has a usable upstream
    fn upstream_file(&self, store: &ArtifactStore, path: &str) -> DepotResult<Option<PathBuf>> {
        let Some(url) = store.url() else {
            return Ok(None);
        };

        let base = url.strip_prefix(FILE_SCHEME).ok_or_else(|| {
            DepotError::location(url, "no transport available for this scheme")
        })?;

        let base = Path::new(base);
        if !base.is_dir() {
            return Err(DepotError::location(url, "upstream directory is unreachable"));
        }

        Ok(Some(base.join(validate_path(path)?)))
    }

    async fn write_atomic(&self, file: &Path, content: &[u8]) -> DepotResult<()> {
        let parent = file
            .parent()
            .ok_or_else(|| DepotError::Internal(format!("{} has no parent", file.display())))?;
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DepotError::io(format!("creating {}", parent.display()), e))?;

        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = parent.join(format!(".depot-{}-{}.tmp", std::process::id(), n));
        fs::write(&tmp, content)
            .await
            .map_err(|e| DepotError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, file)
            .await
            .map_err(|e| DepotError::io(format!("moving content into {}", file.display()), e))
    }
}

/// Reject absolute, traversing, or empty paths
fn validate_path(path: &str) -> DepotResult<PathBuf> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(DepotError::PathInvalid {
            path: path.to_string(),
            reason: "path is empty".to_string(),
        });
    }
    if trimmed.contains('\0') || trimmed.split('/').any(|seg| seg == "..") {
        return Err(DepotError::PathInvalid {
            path: path.to_string(),
            reason: "must not contain '..' segments".to_string(),
        });
    }
    Ok(PathBuf::from(trimmed))
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

async fn read_listing(dir: &Path, key: &StoreKey, path: &str) -> DepotResult<Vec<StoreResource>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(DepotError::io(format!("listing {}", dir.display()), e)),
    };

    let mut listed = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DepotError::io(format!("listing {}", dir.display()), e))?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(".depot-") {
            continue;
        }
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        let child = child_path(path, &name);
        listed.push(if is_dir {
            StoreResource::dir(key.clone(), format!("{}/", child))
        } else {
            StoreResource::file(key.clone(), child)
        });
    }

    listed.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(listed)
}

#[async_trait]
impl TransferManager for FileTransferManager {
    async fn retrieve(&self, store: &ArtifactStore, path: &str) -> DepotResult<Option<Transfer>> {
        let transfer = self.transfer(store, path)?;
        if transfer.exists().await {
            trace!("Local hit for {}", transfer);
            return Ok(Some(transfer));
        }

        let Some(upstream) = self.upstream_file(store, path)? else {
            return Ok(None);
        };

        if !is_file(&upstream).await {
            trace!("Upstream of {} has no {}", store.key(), path);
            return Ok(None);
        }

        let content = fs::read(&upstream).await.map_err(|e| DepotError::TransferFailed {
            key: store.key(),
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        self.write_atomic(transfer.file(), &content).await?;
        debug!("Pulled {} from upstream {}", transfer, upstream.display());

        Ok(Some(transfer))
    }

    async fn store(
        &self,
        store: &ArtifactStore,
        path: &str,
        content: &[u8],
    ) -> DepotResult<Transfer> {
        let transfer = self.transfer(store, path)?;
        self.write_atomic(transfer.file(), content).await?;
        debug!("Wrote {} bytes to {}", content.len(), transfer);
        Ok(transfer)
    }

    async fn delete(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool> {
        let file = self.file_for(&store.key(), path)?;
        match fs::remove_file(&file).await {
            Ok(()) => {
                debug!("Deleted {}:{}", store.key(), path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DepotError::io(format!("deleting {}", file.display()), e)),
        }
    }

    async fn list(&self, store: &ArtifactStore, path: &str) -> DepotResult<Vec<StoreResource>> {
        let key = store.key();
        let dir = if path.trim_matches('/').is_empty() {
            self.store_dir(&key)
        } else {
            self.file_for(&key, path)?
        };

        let mut listed = read_listing(&dir, &key, path).await?;

        if store.url().is_some() {
            let upstream_dir = if path.trim_matches('/').is_empty() {
                store
                    .url()
                    .and_then(|u| u.strip_prefix(FILE_SCHEME))
                    .map(PathBuf::from)
            } else {
                self.upstream_file(store, path)?
            };
            if let Some(upstream_dir) = upstream_dir {
                listed.extend(read_listing(&upstream_dir, &key, path).await?);
            }
        }

        Ok(listed)
    }

    async fn exists(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool> {
        if self.transfer(store, path)?.exists().await {
            return Ok(true);
        }
        match self.upstream_file(store, path)? {
            Some(upstream) => Ok(is_file(&upstream).await),
            None => Ok(false),
        }
    }

    fn storage_reference(&self, store: &ArtifactStore, path: &str) -> DepotResult<Transfer> {
        self.transfer(store, path)
    }
}
