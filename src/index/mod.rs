//! Content index
//!
//! Maps `(store key, path)` to the concrete store that last served that
//! path. Entries are hints: they may point at content that has since been
//! removed, and readers must confirm existence before trusting them.

pub mod decorator;

pub use decorator::IndexingContentManager;

use crate::error::DepotResult;
use crate::store::StoreKey;
use crate::transfer::Transfer;
use async_trait::async_trait;
use moka::sync::Cache;
use std::time::Duration;
use tracing::{debug, trace};

/// Where an indexed path was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedStorePath {
    /// Store the entry is filed under (may be a group)
    pub key: StoreKey,
    /// Concrete store holding the content
    pub origin: StoreKey,
    pub path: String,
}

/// Index of which store holds which path
#[async_trait]
pub trait ContentIndex: Send + Sync {
    async fn get_indexed_store_path(
        &self,
        key: &StoreKey,
        path: &str,
    ) -> DepotResult<Option<IndexedStorePath>>;

    /// Record `transfer` under its own store, under `key`, and under `top`
    /// when given
    async fn index_transfer_in(
        &self,
        transfer: &Transfer,
        key: &StoreKey,
        top: Option<&StoreKey>,
    ) -> DepotResult<()>;

    async fn de_index_store_path(&self, key: &StoreKey, path: &str) -> DepotResult<()>;

    /// Drop every entry filed under `key`
    async fn clear_store(&self, key: &StoreKey) -> DepotResult<()>;
}

type IndexKey = (StoreKey, String);

/// In-process index bounded by entry count, with optional idle expiry
pub struct MemoryContentIndex {
    entries: Cache<IndexKey, IndexedStorePath>,
}

impl MemoryContentIndex {
    pub fn new(max_entries: u64, idle: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_entries);
        if let Some(idle) = idle {
            builder = builder.time_to_idle(idle);
        }
        Self {
            entries: builder.build(),
        }
    }

    fn put(&self, key: &StoreKey, origin: &StoreKey, path: &str) {
        trace!("Indexing {}:{} -> {}", key, path, origin);
        self.entries.insert(
            (key.clone(), path.to_string()),
            IndexedStorePath {
                key: key.clone(),
                origin: origin.clone(),
                path: path.to_string(),
            },
        );
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

impl std::fmt::Debug for MemoryContentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryContentIndex")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl ContentIndex for MemoryContentIndex {
    async fn get_indexed_store_path(
        &self,
        key: &StoreKey,
        path: &str,
    ) -> DepotResult<Option<IndexedStorePath>> {
        Ok(self.entries.get(&(key.clone(), path.to_string())))
    }

    async fn index_transfer_in(
        &self,
        transfer: &Transfer,
        key: &StoreKey,
        top: Option<&StoreKey>,
    ) -> DepotResult<()> {
        let origin = transfer.store_key();
        let path = transfer.path();

        self.put(origin, origin, path);
        if key != origin {
            self.put(key, origin, path);
        }
        if let Some(top) = top.filter(|t| *t != key && *t != origin) {
            self.put(top, origin, path);
        }
        Ok(())
    }

    async fn de_index_store_path(&self, key: &StoreKey, path: &str) -> DepotResult<()> {
        trace!("De-indexing {}:{}", key, path);
        self.entries.invalidate(&(key.clone(), path.to_string()));
        Ok(())
    }

    async fn clear_store(&self, key: &StoreKey) -> DepotResult<()> {
        let filed: Vec<IndexKey> = self
            .entries
            .iter()
            .filter(|(entry_key, _)| &entry_key.0 == key)
            .map(|(entry_key, _)| (*entry_key).clone())
            .collect();
        debug!("Clearing {} index entries for {}", filed.len(), key);
        for entry_key in filed {
            self.entries.invalidate(&entry_key);
        }
        Ok(())
    }
}
