//! In-memory store catalog

use crate::catalog::StoreCatalog;
use crate::error::DepotResult;
use crate::store::{ArtifactStore, StoreKey, StoreType};
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

/// Catalog held in a concurrent map.
///
/// Single-key reads and writes are atomic; there is no cross-key snapshot.
#[derive(Debug, Default)]
pub struct MemoryStoreCatalog {
    stores: DashMap<StoreKey, ArtifactStore>,
}

impl MemoryStoreCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-populated with `stores`
    pub fn with_stores(stores: impl IntoIterator<Item = ArtifactStore>) -> Self {
        let catalog = Self::new();
        for store in stores {
            catalog.insert(store);
        }
        catalog
    }

    /// Synchronous insert, for setup code outside an async context
    pub fn insert(&self, store: ArtifactStore) -> Option<ArtifactStore> {
        self.stores.insert(store.key(), store)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

#[async_trait]
impl StoreCatalog for MemoryStoreCatalog {
    async fn get_artifact_store(&self, key: &StoreKey) -> DepotResult<Option<ArtifactStore>> {
        Ok(self.stores.get(key).map(|entry| entry.value().clone()))
    }

    async fn all_stores(&self, store_type: Option<StoreType>) -> DepotResult<Vec<ArtifactStore>> {
        let mut stores: Vec<ArtifactStore> = self
            .stores
            .iter()
            .filter(|entry| store_type.map_or(true, |t| entry.key().store_type() == t))
            .map(|entry| entry.value().clone())
            .collect();
        stores.sort_by_key(|s| s.key());
        Ok(stores)
    }

    async fn put_store(&self, store: ArtifactStore) -> DepotResult<()> {
        debug!("Storing definition of {}", store.key());
        self.insert(store);
        Ok(())
    }

    async fn remove_store(&self, key: &StoreKey) -> DepotResult<Option<ArtifactStore>> {
        debug!("Removing definition of {}", key);
        Ok(self.stores.remove(key).map(|(_, store)| store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_remove() {
        let catalog = MemoryStoreCatalog::new();
        catalog.put_store(ArtifactStore::hosted("local")).await.unwrap();

        let key = StoreKey::hosted("local");
        assert!(catalog.get_artifact_store(&key).await.unwrap().is_some());
        assert!(catalog
            .get_artifact_store(&StoreKey::remote("local"))
            .await
            .unwrap()
            .is_none());

        let removed = catalog.remove_store(&key).await.unwrap();
        assert_eq!(removed.map(|s| s.key()), Some(key.clone()));
        assert!(catalog.get_artifact_store(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn all_stores_filters_by_type() {
        let catalog = MemoryStoreCatalog::with_stores([
            ArtifactStore::hosted("b"),
            ArtifactStore::hosted("a"),
            ArtifactStore::group("g", vec![]),
        ]);

        let hosted = catalog.all_stores(Some(StoreType::Hosted)).await.unwrap();
        let names: Vec<&str> = hosted.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(catalog.all_stores(None).await.unwrap().len(), 3);
    }
}
