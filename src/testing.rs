//! Shared fixtures for unit tests

use crate::catalog::MemoryStoreCatalog;
use crate::content::{ContentManager, DefaultContentManager, Generators};
use crate::error::DepotResult;
use crate::store::{ArtifactStore, StoreKey};
use crate::transfer::{FileTransferManager, StoreResource, Transfer, TransferManager, TransferOperation};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tempfile::TempDir;

/// Catalog plus filesystem storage in a temporary directory
pub struct Fixture {
    pub temp: TempDir,
    pub catalog: Arc<MemoryStoreCatalog>,
    pub transfers: Arc<FileTransferManager>,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let transfers = Arc::new(FileTransferManager::new(temp.path().join("storage")));
        Self {
            temp,
            catalog: Arc::new(MemoryStoreCatalog::new()),
            transfers,
        }
    }

    /// Register a store definition and hand it back
    pub fn add(&self, store: ArtifactStore) -> ArtifactStore {
        self.catalog.insert(store.clone());
        store
    }

    /// A remote store backed by an empty `file://` upstream
    pub fn remote(&self, name: &str) -> ArtifactStore {
        let upstream = self.temp.path().join("upstream").join(name);
        std::fs::create_dir_all(&upstream).unwrap();
        ArtifactStore::remote(name, format!("file://{}", upstream.display()))
    }

    /// Write content straight into a store's storage
    pub async fn seed(&self, store: &ArtifactStore, path: &str, content: &str) {
        self.transfers
            .store(store, path, content.as_bytes())
            .await
            .unwrap();
    }

    pub fn router(&self) -> Arc<DefaultContentManager> {
        self.router_with(Generators::new())
    }

    pub fn router_with(&self, generators: Generators) -> Arc<DefaultContentManager> {
        Arc::new(DefaultContentManager::new(
            self.catalog.clone(),
            self.transfers.clone(),
            generators,
        ))
    }
}

/// Content manager that counts calls reaching the wrapped manager
pub struct ProbeContentManager {
    inner: Arc<dyn ContentManager>,
    retrieves: DashMap<StoreKey, usize>,
    references: DashMap<StoreKey, usize>,
}

impl ProbeContentManager {
    pub fn new(inner: Arc<dyn ContentManager>) -> Self {
        Self {
            inner,
            retrieves: DashMap::new(),
            references: DashMap::new(),
        }
    }

    /// Single-store retrievals issued for `key`
    pub fn retrieves(&self, key: &StoreKey) -> usize {
        self.retrieves.get(key).map(|n| *n).unwrap_or(0)
    }

    /// Total single-store retrievals
    pub fn total_retrieves(&self) -> usize {
        self.retrieves.iter().map(|e| *e.value()).sum()
    }

    /// Storage reference lookups issued for `key`
    pub fn references(&self, key: &StoreKey) -> usize {
        self.references.get(key).map(|n| *n).unwrap_or(0)
    }
}

#[async_trait]
impl ContentManager for ProbeContentManager {
    async fn retrieve(&self, store: &ArtifactStore, path: &str) -> DepotResult<Option<Transfer>> {
        *self.retrieves.entry(store.key()).or_insert(0) += 1;
        self.inner.retrieve(store, path).await
    }

    async fn retrieve_all(&self, stores: &[ArtifactStore], path: &str) -> DepotResult<Vec<Transfer>> {
        self.inner.retrieve_all(stores, path).await
    }

    async fn store(&self, store: &ArtifactStore, path: &str, content: &[u8]) -> DepotResult<Transfer> {
        self.inner.store(store, path, content).await
    }

    async fn store_in(
        &self,
        stores: &[ArtifactStore],
        top_key: &StoreKey,
        path: &str,
        content: &[u8],
    ) -> DepotResult<Transfer> {
        self.inner.store_in(stores, top_key, path, content).await
    }

    async fn delete(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool> {
        self.inner.delete(store, path).await
    }

    async fn list(&self, store: &ArtifactStore, path: &str) -> DepotResult<Vec<StoreResource>> {
        self.inner.list(store, path).await
    }

    async fn list_all(&self, stores: &[ArtifactStore], path: &str) -> DepotResult<Vec<StoreResource>> {
        self.inner.list_all(stores, path).await
    }

    async fn exists(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool> {
        self.inner.exists(store, path).await
    }

    async fn get_transfer(
        &self,
        store: &ArtifactStore,
        path: &str,
        op: TransferOperation,
    ) -> DepotResult<Option<Transfer>> {
        *self.references.entry(store.key()).or_insert(0) += 1;
        self.inner.get_transfer(store, path, op).await
    }

    async fn get_transfer_by_key(
        &self,
        key: &StoreKey,
        path: &str,
        op: TransferOperation,
    ) -> DepotResult<Option<Transfer>> {
        *self.references.entry(key.clone()).or_insert(0) += 1;
        self.inner.get_transfer_by_key(key, path, op).await
    }

    async fn get_transfer_first(
        &self,
        stores: &[ArtifactStore],
        path: &str,
        op: TransferOperation,
    ) -> DepotResult<Option<Transfer>> {
        self.inner.get_transfer_first(stores, path, op).await
    }
}
