//! Flat-file store catalog
//!
//! Definitions live as one JSON document per store:
//! `{dir}/{type}/{name}.json`. The directory is read once at load time and
//! kept in memory; writes go to both.

use crate::catalog::memory::MemoryStoreCatalog;
use crate::catalog::StoreCatalog;
use crate::error::{DepotError, DepotResult};
use crate::store::{ArtifactStore, StoreKey, StoreType};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Catalog backed by a directory of JSON definitions
#[derive(Debug)]
pub struct FlatFileCatalog {
    dir: PathBuf,
    stores: MemoryStoreCatalog,
}

impl FlatFileCatalog {
    /// Load every definition under `dir`.
    ///
    /// A missing directory is an empty catalog. A definition that does not
    /// parse, or whose type/name disagree with its location, is an error.
    pub async fn load(dir: impl Into<PathBuf>) -> DepotResult<Self> {
        let dir = dir.into();
        let stores = MemoryStoreCatalog::new();

        for store_type in StoreType::ALL {
            let type_dir = dir.join(store_type.as_str());
            let mut entries = match fs::read_dir(&type_dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(DepotError::io(
                        format!("reading store directory {}", type_dir.display()),
                        e,
                    ))
                }
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| DepotError::io("reading store directory entry", e))?
            {
                let path = entry.path();
                if path.extension().is_none_or(|ext| ext != "json") {
                    continue;
                }
                let store = read_definition(&path, store_type).await?;
                debug!("Loaded {} from {}", store.key(), path.display());
                stores.insert(store);
            }
        }

        info!("Loaded {} store definitions from {}", stores.len(), dir.display());
        Ok(Self { dir, stores })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn definition_path(&self, key: &StoreKey) -> PathBuf {
        self.dir
            .join(key.store_type().as_str())
            .join(format!("{}.json", key.name()))
    }
}

async fn read_definition(path: &Path, expected: StoreType) -> DepotResult<ArtifactStore> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| DepotError::io(format!("reading store definition {}", path.display()), e))?;

    let store: ArtifactStore =
        serde_json::from_str(&content).map_err(|e| DepotError::CatalogInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if store.store_type() != expected {
        return Err(DepotError::CatalogInvalid {
            path: path.to_path_buf(),
            reason: format!("declares type {} but lives under {}/", store.store_type(), expected),
        });
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if stem != store.name {
        return Err(DepotError::CatalogInvalid {
            path: path.to_path_buf(),
            reason: format!("declares name '{}' but file is named '{}'", store.name, stem),
        });
    }

    Ok(store)
}

#[async_trait]
impl StoreCatalog for FlatFileCatalog {
    async fn get_artifact_store(&self, key: &StoreKey) -> DepotResult<Option<ArtifactStore>> {
        self.stores.get_artifact_store(key).await
    }

    async fn all_stores(&self, store_type: Option<StoreType>) -> DepotResult<Vec<ArtifactStore>> {
        self.stores.all_stores(store_type).await
    }

    async fn put_store(&self, store: ArtifactStore) -> DepotResult<()> {
        let path = self.definition_path(&store.key());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DepotError::io(format!("creating {}", parent.display()), e))?;
        }

        let content = serde_json::to_string_pretty(&store)?;
        fs::write(&path, content)
            .await
            .map_err(|e| DepotError::io(format!("writing store definition {}", path.display()), e))?;

        self.stores.put_store(store).await
    }

    async fn remove_store(&self, key: &StoreKey) -> DepotResult<Option<ArtifactStore>> {
        let path = self.definition_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DepotError::io(
                    format!("removing store definition {}", path.display()),
                    e,
                ))
            }
        }
        self.stores.remove_store(key).await
    }
}
