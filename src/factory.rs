//! Wiring of the content stack from configuration

use crate::catalog::{FlatFileCatalog, StoreCatalog};
use crate::config::Config;
use crate::content::{
    ChecksumGenerator, ContentManager, DefaultContentManager, Generators, VersionListMerger,
};
use crate::error::{DepotError, DepotResult};
use crate::index::{ContentIndex, IndexingContentManager, MemoryContentIndex};
use crate::nfc::{MemoryNotFoundCache, NoOpNotFoundCache, NotFoundCache};
use crate::store::{ArtifactStore, StoreKey};
use crate::transfer::{FileTransferManager, TransferManager};
use std::sync::Arc;
use tracing::debug;

/// Built-in generators, in the order they are consulted
pub fn default_generators(transfers: Arc<dyn TransferManager>) -> Generators {
    Generators::new()
        .register(Arc::new(VersionListMerger::new(transfers.clone())))
        .register(Arc::new(ChecksumGenerator::new(transfers)))
}

/// A fully wired content stack
pub struct Depot {
    pub catalog: Arc<dyn StoreCatalog>,
    pub transfers: Arc<dyn TransferManager>,
    pub content: Arc<dyn ContentManager>,
    pub nfc: Arc<dyn NotFoundCache>,
    pub index: Option<Arc<dyn ContentIndex>>,
}

impl Depot {
    /// Load the catalog and storage locations named by `config`
    pub async fn from_config(config: &Config) -> DepotResult<Self> {
        let catalog = FlatFileCatalog::load(config.catalog_dir()).await?;
        let transfers = FileTransferManager::new(config.storage_root());
        Ok(Self::assemble(config, Arc::new(catalog), Arc::new(transfers)))
    }

    /// Wire a content stack around an existing catalog and transfer layer.
    ///
    /// With the index disabled the router is used directly; the not-found
    /// cache is only consulted through the indexing layer.
    pub fn assemble(
        config: &Config,
        catalog: Arc<dyn StoreCatalog>,
        transfers: Arc<dyn TransferManager>,
    ) -> Self {
        let generators = default_generators(transfers.clone());
        let router: Arc<dyn ContentManager> = Arc::new(DefaultContentManager::new(
            catalog.clone(),
            transfers.clone(),
            generators.clone(),
        ));

        let nfc: Arc<dyn NotFoundCache> = if config.nfc.enabled {
            Arc::new(MemoryNotFoundCache::new(config.nfc.ttl(), config.nfc.max_entries))
        } else {
            Arc::new(NoOpNotFoundCache)
        };

        let (content, index) = if config.index.enabled {
            let index: Arc<dyn ContentIndex> = Arc::new(MemoryContentIndex::new(
                config.index.max_entries,
                config.index.idle(),
            ));
            let content: Arc<dyn ContentManager> = Arc::new(IndexingContentManager::new(
                router,
                catalog.clone(),
                generators,
                index.clone(),
                nfc.clone(),
            ));
            (content, Some(index))
        } else {
            debug!("Content index disabled, routing directly");
            (router, None)
        };

        Self {
            catalog,
            transfers,
            content,
            nfc,
            index,
        }
    }

    /// Look up a store definition that must exist
    pub async fn store(&self, key: &StoreKey) -> DepotResult<ArtifactStore> {
        self.catalog
            .get_artifact_store(key)
            .await?
            .ok_or_else(|| {
                if key.is_group() {
                    DepotError::GroupNotFound(key.name().to_string())
                } else {
                    DepotError::StoreNotFound(key.clone())
                }
            })
    }
}
