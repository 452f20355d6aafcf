//! Content routing
//!
//! [`ContentManager`] is the seam every content operation goes through.
//! [`DefaultContentManager`] routes requests to stores directly;
//! [`crate::index::IndexingContentManager`] wraps any manager with the
//! content index and the not-found cache.

pub mod checksum;
pub mod generator;
pub mod router;
pub mod versions;

pub use checksum::ChecksumGenerator;
pub use generator::{ContentGenerator, Generators};
pub use router::DefaultContentManager;
pub use versions::VersionListMerger;

use crate::error::DepotResult;
use crate::store::{ArtifactStore, StoreKey};
use crate::transfer::{StoreResource, Transfer, TransferOperation};
use async_trait::async_trait;
use tracing::warn;

/// Retrieve, store, delete, and list content across stores
#[async_trait]
pub trait ContentManager: Send + Sync {
    /// Content for `path` in `store`. For groups, the first member (in
    /// declared order) that has it wins.
    async fn retrieve(&self, store: &ArtifactStore, path: &str) -> DepotResult<Option<Transfer>>;

    /// First hit across `stores`, in order
    async fn retrieve_first(
        &self,
        stores: &[ArtifactStore],
        path: &str,
    ) -> DepotResult<Option<Transfer>> {
        for store in stores {
            if let Some(transfer) = self.retrieve(store, path).await? {
                return Ok(Some(transfer));
            }
        }
        Ok(None)
    }

    /// Every hit across `stores`, expanding groups to all their members
    async fn retrieve_all(&self, stores: &[ArtifactStore], path: &str)
        -> DepotResult<Vec<Transfer>>;

    /// Write content. Group uploads land in the first eligible member.
    async fn store(&self, store: &ArtifactStore, path: &str, content: &[u8])
        -> DepotResult<Transfer>;

    /// Write content into the first eligible store in `stores`, on behalf
    /// of `top_key`
    async fn store_in(
        &self,
        stores: &[ArtifactStore],
        top_key: &StoreKey,
        path: &str,
        content: &[u8],
    ) -> DepotResult<Transfer>;

    /// Delete content. Groups delete from every member holding it.
    async fn delete(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool>;

    /// Delete from each of `stores`; a failing store does not stop the rest
    async fn delete_all(&self, stores: &[ArtifactStore], path: &str) -> DepotResult<bool> {
        let mut deleted = false;
        for store in stores {
            match self.delete(store, path).await {
                Ok(result) => deleted |= result,
                Err(e) => warn!("Failed to delete {}:{}: {}", store.key(), path, e),
            }
        }
        Ok(deleted)
    }

    /// Directory listing, including generated entries, deduplicated
    async fn list(&self, store: &ArtifactStore, path: &str) -> DepotResult<Vec<StoreResource>>;

    /// Merged listing across `stores`
    async fn list_all(&self, stores: &[ArtifactStore], path: &str)
        -> DepotResult<Vec<StoreResource>>;

    async fn exists(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool>;

    /// Storage reference for `path`, which may not exist yet
    async fn get_transfer(
        &self,
        store: &ArtifactStore,
        path: &str,
        op: TransferOperation,
    ) -> DepotResult<Option<Transfer>>;

    /// Like [`ContentManager::get_transfer`], looking the store up first.
    /// An unknown key is an error.
    async fn get_transfer_by_key(
        &self,
        key: &StoreKey,
        path: &str,
        op: TransferOperation,
    ) -> DepotResult<Option<Transfer>>;

    /// Storage reference from the first suitable store in `stores`
    async fn get_transfer_first(
        &self,
        stores: &[ArtifactStore],
        path: &str,
        op: TransferOperation,
    ) -> DepotResult<Option<Transfer>>;
}

/// Drop listing entries whose path was already seen, keeping the first
pub fn dedupe_listing(listed: Vec<StoreResource>) -> Vec<StoreResource> {
    let mut seen = std::collections::HashSet::new();
    listed
        .into_iter()
        .filter(|r| seen.insert(r.path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let a = StoreKey::hosted("a");
        let b = StoreKey::hosted("b");
        let listed = vec![
            StoreResource::file(a.clone(), "x.jar"),
            StoreResource::file(b.clone(), "x.jar"),
            StoreResource::file(b, "y.jar"),
        ];

        let deduped = dedupe_listing(listed);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].key, a);
        assert_eq!(deduped[1].path, "y.jar");
    }
}
