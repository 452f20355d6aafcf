//! Not-found cache (NFC)
//!
//! Remembers resources known to be absent so group lookups can answer
//! "missing" without walking every member again. Entries expire after a
//! TTL and are cleared explicitly when content is stored.
//!
//! # Entry lifecycle
//!
//! | Event | Effect |
//! |-------|--------|
//! | Group walk finds nothing | `add_missing(group location, path)` |
//! | Content stored into group or member | `clear_missing` |
//! | TTL elapses | entry silently dropped |

use crate::error::DepotResult;
use crate::store::{ConcreteResource, Location};
use async_trait::async_trait;
use moka::sync::Cache;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Cache of resources known to be missing
#[async_trait]
pub trait NotFoundCache: Send + Sync {
    async fn is_missing(&self, resource: &ConcreteResource) -> DepotResult<bool>;

    async fn add_missing(&self, resource: ConcreteResource) -> DepotResult<()>;

    async fn clear_missing(&self, resource: &ConcreteResource) -> DepotResult<()>;

    /// Forget every missing path at `location`
    async fn clear_location(&self, location: &Location) -> DepotResult<()>;

    async fn clear_all(&self) -> DepotResult<()>;

    /// Missing paths at `location`, sorted
    async fn get_missing(&self, location: &Location) -> DepotResult<Vec<String>>;

    /// Every missing path, grouped by location
    async fn get_all_missing(&self) -> DepotResult<HashMap<Location, Vec<String>>>;
}

/// In-process NFC with per-entry TTL
pub struct MemoryNotFoundCache {
    entries: Cache<ConcreteResource, ()>,
}

impl MemoryNotFoundCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
        }
    }

    fn resources_at(&self, location: &Location) -> Vec<ConcreteResource> {
        self.entries
            .iter()
            .filter(|(resource, _)| resource.location() == location)
            .map(|(resource, _)| (*resource).clone())
            .collect()
    }
}

impl std::fmt::Debug for MemoryNotFoundCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNotFoundCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl NotFoundCache for MemoryNotFoundCache {
    async fn is_missing(&self, resource: &ConcreteResource) -> DepotResult<bool> {
        Ok(self.entries.contains_key(resource))
    }

    async fn add_missing(&self, resource: ConcreteResource) -> DepotResult<()> {
        debug!("NFC: marking {} missing", resource);
        self.entries.insert(resource, ());
        Ok(())
    }

    async fn clear_missing(&self, resource: &ConcreteResource) -> DepotResult<()> {
        self.entries.invalidate(resource);
        Ok(())
    }

    async fn clear_location(&self, location: &Location) -> DepotResult<()> {
        let resources = self.resources_at(location);
        debug!("NFC: clearing {} entries at {}", resources.len(), location);
        for resource in resources {
            self.entries.invalidate(&resource);
        }
        Ok(())
    }

    async fn clear_all(&self) -> DepotResult<()> {
        self.entries.invalidate_all();
        Ok(())
    }

    async fn get_missing(&self, location: &Location) -> DepotResult<Vec<String>> {
        let mut paths: Vec<String> = self
            .resources_at(location)
            .into_iter()
            .map(|r| r.path().to_string())
            .collect();
        paths.sort();
        Ok(paths)
    }

    async fn get_all_missing(&self) -> DepotResult<HashMap<Location, Vec<String>>> {
        let mut all: HashMap<Location, Vec<String>> = HashMap::new();
        for (resource, _) in self.entries.iter() {
            all.entry(resource.location().clone())
                .or_default()
                .push(resource.path().to_string());
        }
        for paths in all.values_mut() {
            paths.sort();
        }
        Ok(all)
    }
}

/// NFC that never remembers anything
#[derive(Debug, Default)]
pub struct NoOpNotFoundCache;

#[async_trait]
impl NotFoundCache for NoOpNotFoundCache {
    async fn is_missing(&self, _resource: &ConcreteResource) -> DepotResult<bool> {
        Ok(false)
    }

    async fn add_missing(&self, _resource: ConcreteResource) -> DepotResult<()> {
        Ok(())
    }

    async fn clear_missing(&self, _resource: &ConcreteResource) -> DepotResult<()> {
        Ok(())
    }

    async fn clear_location(&self, _location: &Location) -> DepotResult<()> {
        Ok(())
    }

    async fn clear_all(&self) -> DepotResult<()> {
        Ok(())
    }

    async fn get_missing(&self, _location: &Location) -> DepotResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn get_all_missing(&self) -> DepotResult<HashMap<Location, Vec<String>>> {
        Ok(HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ArtifactStore;

    fn nfc() -> MemoryNotFoundCache {
        MemoryNotFoundCache::new(Duration::from_secs(60), 1_000)
    }

    #[tokio::test]
    async fn add_then_clear() {
        let nfc = nfc();
        let group = ArtifactStore::group("public", vec![]);
        let resource = ConcreteResource::of(&group, "org/x.jar");

        assert!(!nfc.is_missing(&resource).await.unwrap());
        nfc.add_missing(resource.clone()).await.unwrap();
        assert!(nfc.is_missing(&resource).await.unwrap());

        nfc.clear_missing(&resource).await.unwrap();
        assert!(!nfc.is_missing(&resource).await.unwrap());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let nfc = MemoryNotFoundCache::new(Duration::from_millis(50), 1_000);
        let resource = ConcreteResource::of(&ArtifactStore::hosted("local"), "a");
        nfc.add_missing(resource.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!nfc.is_missing(&resource).await.unwrap());
    }

    #[tokio::test]
    async fn clear_location_leaves_other_locations() {
        let nfc = nfc();
        let public = ArtifactStore::group("public", vec![]);
        let other = ArtifactStore::group("other", vec![]);

        nfc.add_missing(ConcreteResource::of(&public, "b")).await.unwrap();
        nfc.add_missing(ConcreteResource::of(&public, "a")).await.unwrap();
        nfc.add_missing(ConcreteResource::of(&other, "a")).await.unwrap();

        let public_location = Location::from_store(&public);
        assert_eq!(nfc.get_missing(&public_location).await.unwrap(), ["a", "b"]);

        nfc.clear_location(&public_location).await.unwrap();
        assert!(nfc.get_missing(&public_location).await.unwrap().is_empty());

        let all = nfc.get_all_missing().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[&Location::from_store(&other)], ["a"]);
    }

    #[tokio::test]
    async fn noop_never_reports_missing() {
        let nfc = NoOpNotFoundCache;
        let resource = ConcreteResource::of(&ArtifactStore::hosted("local"), "a");
        nfc.add_missing(resource.clone()).await.unwrap();
        assert!(!nfc.is_missing(&resource).await.unwrap());
    }
}
