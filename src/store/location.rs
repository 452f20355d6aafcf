//! Physical locations and resources
//!
//! The not-found cache and the transfer layer work at location granularity
//! rather than on raw store keys.

use crate::store::artifact::ArtifactStore;
use crate::store::key::StoreKey;
use std::fmt;

/// Where a store's content physically lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    key: StoreKey,
    uri: String,
}

impl Location {
    /// Derive the location of a store.
    ///
    /// Remote stores live at their upstream URL; hosted stores and groups
    /// live in local storage.
    pub fn from_store(store: &ArtifactStore) -> Self {
        match store.url() {
            Some(url) => Self {
                key: store.key(),
                uri: url.to_string(),
            },
            None => Self::local(store.key()),
        }
    }

    /// Location of a store kept in local storage (hosted or group)
    pub fn local(key: StoreKey) -> Self {
        let uri = format!("depot:{}/{}", key.store_type(), key.name());
        Self { key, uri }
    }

    pub fn key(&self) -> &StoreKey {
        &self.key
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.uri)
    }
}

/// A path at a specific location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConcreteResource {
    location: Location,
    path: String,
}

impl ConcreteResource {
    pub fn new(location: Location, path: impl Into<String>) -> Self {
        Self {
            location,
            path: path.into(),
        }
    }

    /// Resource for `path` inside `store`
    pub fn of(store: &ArtifactStore, path: &str) -> Self {
        Self::new(Location::from_store(store), path)
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ConcreteResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.location.key, self.path)
    }
}
