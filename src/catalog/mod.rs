//! Store catalog
//!
//! The catalog answers "what is the current definition of this store?".
//! It is read-mostly: definitions may change between two lookups made by
//! the same request, and callers accept that snapshot staleness.

pub mod flat;
pub mod memory;
pub mod resolve;

pub use flat::FlatFileCatalog;
pub use memory::MemoryStoreCatalog;

use crate::error::DepotResult;
use crate::store::{ArtifactStore, StoreKey, StoreType};
use async_trait::async_trait;

/// Lookup service for store definitions
#[async_trait]
pub trait StoreCatalog: Send + Sync {
    /// Get the current definition of a store, if it exists
    async fn get_artifact_store(&self, key: &StoreKey) -> DepotResult<Option<ArtifactStore>>;

    /// List every store, optionally restricted to one type
    async fn all_stores(&self, store_type: Option<StoreType>) -> DepotResult<Vec<ArtifactStore>>;

    /// Insert or replace a store definition
    async fn put_store(&self, store: ArtifactStore) -> DepotResult<()>;

    /// Remove a store definition, returning the removed definition
    async fn remove_store(&self, key: &StoreKey) -> DepotResult<Option<ArtifactStore>>;

    /// Flatten a group's membership in retrieval order.
    ///
    /// With `include_groups` the root and every nested group appear in the
    /// result at their traversal position.
    async fn ordered_concrete_stores_in_group(
        &self,
        group_name: &str,
        include_groups: bool,
    ) -> DepotResult<Vec<ArtifactStore>> {
        resolve::ordered_members(self, group_name, include_groups).await
    }

    /// Every group that contains `key`, directly or through nested groups
    async fn groups_containing(&self, key: &StoreKey) -> DepotResult<Vec<ArtifactStore>> {
        resolve::groups_containing(self, key).await
    }
}
