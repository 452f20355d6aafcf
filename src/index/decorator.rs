//! Indexing content manager
//!
//! Wraps another [`ContentManager`] and answers repeat lookups from the
//! content index. Group lookups that miss the index walk the membership
//! one store at a time, record where the path was found under both the
//! member and the group, and remember total misses in the not-found cache.
//!
//! Index entries are checked against storage before use. A stale entry is
//! evicted and the lookup continues as if it had never been indexed.

use crate::catalog::StoreCatalog;
use crate::content::{ContentManager, Generators};
use crate::error::{DepotError, DepotResult};
use crate::index::ContentIndex;
use crate::nfc::NotFoundCache;
use crate::store::{ArtifactStore, ConcreteResource, Location, StoreKey};
use crate::transfer::{StoreResource, Transfer, TransferOperation};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// How to ask a single member for content during a group walk
#[derive(Debug, Clone, Copy)]
enum MemberFetch {
    Retrieve,
    Reference(TransferOperation),
}

/// Content manager consulting the content index and the not-found cache
pub struct IndexingContentManager {
    delegate: Arc<dyn ContentManager>,
    catalog: Arc<dyn StoreCatalog>,
    generators: Generators,
    index: Arc<dyn ContentIndex>,
    nfc: Arc<dyn NotFoundCache>,
}

impl IndexingContentManager {
    pub fn new(
        delegate: Arc<dyn ContentManager>,
        catalog: Arc<dyn StoreCatalog>,
        generators: Generators,
        index: Arc<dyn ContentIndex>,
        nfc: Arc<dyn NotFoundCache>,
    ) -> Self {
        Self {
            delegate,
            catalog,
            generators,
            index,
            nfc,
        }
    }

    /// Indexed content for `(key, path)`, if the entry is still valid.
    ///
    /// An entry is valid while its origin is defined, enabled, accepts the
    /// path and still holds the content. Stale entries are evicted along
    /// with the origin's own entry.
    async fn indexed_transfer(&self, key: &StoreKey, path: &str) -> DepotResult<Option<Transfer>> {
        let Some(indexed) = self.index.get_indexed_store_path(key, path).await? else {
            return Ok(None);
        };

        let origin = self.catalog.get_artifact_store(&indexed.origin).await?;
        let reference = match origin {
            Some(origin) if !origin.disabled && origin.accepts_path(path) => {
                self.delegate
                    .get_transfer(&origin, path, TransferOperation::Download)
                    .await?
            }
            _ => None,
        };

        if let Some(transfer) = reference {
            if transfer.exists().await {
                trace!("Index hit for {}:{} in {}", key, path, indexed.origin);
                return Ok(Some(transfer));
            }
        }

        debug!(
            "Index entry for {}:{} no longer answers from {}, evicting",
            key, path, indexed.origin
        );
        self.index.de_index_store_path(key, path).await?;
        if &indexed.origin != key {
            self.index.de_index_store_path(&indexed.origin, path).await?;
        }
        Ok(None)
    }

    /// Walk a group's membership in priority order, one store at a time.
    ///
    /// Nested groups are expanded in place, before the nested group's later
    /// siblings. Each store is visited once.
    async fn walk_members(
        &self,
        top: &ArtifactStore,
        path: &str,
        fetch: MemberFetch,
    ) -> DepotResult<Option<Transfer>> {
        let top_key = top.key();
        let mut seen = HashSet::from([top_key.clone()]);
        let mut pending: VecDeque<StoreKey> = top.constituents().iter().cloned().collect();

        while let Some(key) = pending.pop_front() {
            if !seen.insert(key.clone()) {
                continue;
            }

            if let Some(transfer) = self.indexed_transfer(&key, path).await? {
                self.index
                    .index_transfer_in(&transfer, &key, Some(&top_key))
                    .await?;
                return Ok(Some(transfer));
            }

            let member = match self.catalog.get_artifact_store(&key).await {
                Ok(Some(member)) => member,
                Ok(None) => {
                    debug!("Member {} of {} has no definition, skipping", key, top_key);
                    continue;
                }
                Err(e) => {
                    warn!("Failed to look up member {} of {}: {}", key, top_key, e);
                    continue;
                }
            };

            if member.is_group() {
                for child in member.constituents().iter().rev() {
                    if !seen.contains(child) {
                        pending.push_front(child.clone());
                    }
                }
                continue;
            }

            let found = match fetch {
                MemberFetch::Retrieve => self.delegate.retrieve(&member, path).await,
                MemberFetch::Reference(op) => self.delegate.get_transfer(&member, path, op).await,
            };

            match found {
                Ok(Some(transfer)) => {
                    if matches!(fetch, MemberFetch::Reference(_)) && !transfer.exists().await {
                        continue;
                    }
                    self.index
                        .index_transfer_in(&transfer, &key, Some(&top_key))
                        .await?;
                    debug!("Found {} in {} for {}", path, key, top_key);
                    return Ok(Some(transfer));
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to retrieve {} from {} in {}: {}", path, key, top_key, e),
            }
        }

        Ok(None)
    }

    /// Index new content and invalidate what it may shadow
    async fn after_storage(&self, top_key: &StoreKey, path: &str, transfer: &Transfer) -> DepotResult<()> {
        let holder = transfer.store_key().clone();
        let top = (top_key != &holder).then_some(top_key);
        self.index.index_transfer_in(transfer, &holder, top).await?;

        if top_key.is_group() {
            self.nfc
                .clear_missing(&ConcreteResource::new(Location::local(top_key.clone()), path))
                .await?;
        }

        // Groups reaching the holder may have indexed a lower-priority copy
        // or recorded the path as missing.
        for group in self.catalog.groups_containing(&holder).await? {
            let group_key = group.key();
            if &group_key == top_key {
                continue;
            }
            self.nfc
                .clear_missing(&ConcreteResource::of(&group, path))
                .await?;
            self.index.de_index_store_path(&group_key, path).await?;
        }

        Ok(())
    }

    /// Remove index entries that may refer to deleted content
    async fn after_deletion(&self, store: &ArtifactStore, path: &str) -> DepotResult<()> {
        let mut affected = BTreeSet::from([store.key()]);
        if store.is_group() {
            for member in self
                .catalog
                .ordered_concrete_stores_in_group(&store.name, true)
                .await?
            {
                affected.insert(member.key());
            }
        }

        let mut containing = BTreeSet::new();
        for key in &affected {
            for group in self.catalog.groups_containing(key).await? {
                containing.insert(group.key());
            }
        }

        for key in affected.iter().chain(containing.iter()) {
            self.index.de_index_store_path(key, path).await?;
        }
        debug!("De-indexed {} after deletion from {}", path, store.key());
        Ok(())
    }
}

#[async_trait]
impl ContentManager for IndexingContentManager {
    async fn retrieve(&self, store: &ArtifactStore, path: &str) -> DepotResult<Option<Transfer>> {
        if self.generators.is_mergable(path) {
            return self.delegate.retrieve(store, path).await;
        }

        let key = store.key();
        if let Some(transfer) = self.indexed_transfer(&key, path).await? {
            return Ok(Some(transfer));
        }

        if !store.is_group() {
            let found = self.delegate.retrieve(store, path).await?;
            if let Some(transfer) = &found {
                self.index.index_transfer_in(transfer, &key, None).await?;
            }
            return Ok(found);
        }

        let resource = ConcreteResource::of(store, path);
        if self.nfc.is_missing(&resource).await? {
            debug!("{} is marked missing, not consulting members", resource);
            return Ok(None);
        }

        let found = self.walk_members(store, path, MemberFetch::Retrieve).await?;
        if found.is_none() {
            self.nfc.add_missing(resource).await?;
        }
        Ok(found)
    }

    async fn retrieve_all(
        &self,
        stores: &[ArtifactStore],
        path: &str,
    ) -> DepotResult<Vec<Transfer>> {
        self.delegate.retrieve_all(stores, path).await
    }

    async fn store(
        &self,
        store: &ArtifactStore,
        path: &str,
        content: &[u8],
    ) -> DepotResult<Transfer> {
        let transfer = self.delegate.store(store, path, content).await?;
        self.after_storage(&store.key(), path, &transfer).await?;
        Ok(transfer)
    }

    async fn store_in(
        &self,
        stores: &[ArtifactStore],
        top_key: &StoreKey,
        path: &str,
        content: &[u8],
    ) -> DepotResult<Transfer> {
        let transfer = self.delegate.store_in(stores, top_key, path, content).await?;
        self.after_storage(top_key, path, &transfer).await?;
        Ok(transfer)
    }

    async fn delete(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool> {
        let deleted = self.delegate.delete(store, path).await?;
        self.after_deletion(store, path).await?;
        Ok(deleted)
    }

    async fn list(&self, store: &ArtifactStore, path: &str) -> DepotResult<Vec<StoreResource>> {
        self.delegate.list(store, path).await
    }

    async fn list_all(
        &self,
        stores: &[ArtifactStore],
        path: &str,
    ) -> DepotResult<Vec<StoreResource>> {
        self.delegate.list_all(stores, path).await
    }

    async fn exists(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool> {
        if !self.generators.is_mergable(path) {
            if self.indexed_transfer(&store.key(), path).await?.is_some() {
                return Ok(true);
            }
            if store.is_group() && self.nfc.is_missing(&ConcreteResource::of(store, path)).await? {
                return Ok(false);
            }
        }
        self.delegate.exists(store, path).await
    }

    async fn get_transfer(
        &self,
        store: &ArtifactStore,
        path: &str,
        op: TransferOperation,
    ) -> DepotResult<Option<Transfer>> {
        if op != TransferOperation::Download || self.generators.is_mergable(path) {
            return self.delegate.get_transfer(store, path, op).await;
        }

        let key = store.key();
        if let Some(transfer) = self.indexed_transfer(&key, path).await? {
            return Ok(Some(transfer));
        }

        if store.is_group() {
            let resource = ConcreteResource::of(store, path);
            if self.nfc.is_missing(&resource).await? {
                debug!("{} is marked missing, not consulting members", resource);
                return Ok(None);
            }

            let found = self.walk_members(store, path, MemberFetch::Reference(op)).await?;
            if found.is_none() {
                self.nfc.add_missing(resource).await?;
            }
            return Ok(found);
        }

        let found = self.delegate.get_transfer(store, path, op).await?;
        if let Some(transfer) = &found {
            if transfer.exists().await {
                self.index.index_transfer_in(transfer, &key, None).await?;
            }
        }
        Ok(found)
    }

    async fn get_transfer_by_key(
        &self,
        key: &StoreKey,
        path: &str,
        op: TransferOperation,
    ) -> DepotResult<Option<Transfer>> {
        let store = self
            .catalog
            .get_artifact_store(key)
            .await?
            .ok_or_else(|| DepotError::StoreNotFound(key.clone()))?;
        self.get_transfer(&store, path, op).await
    }

    async fn get_transfer_first(
        &self,
        stores: &[ArtifactStore],
        path: &str,
        op: TransferOperation,
    ) -> DepotResult<Option<Transfer>> {
        self.delegate.get_transfer_first(stores, path, op).await
    }
}
