//! Content generator plugins
//!
//! Generators synthesize virtual content (checksums, merged metadata) when
//! physical content is absent, and react to storage and deletion so derived
//! files do not go stale. They are consulted in registration order.

use crate::error::DepotResult;
use crate::store::ArtifactStore;
use crate::transfer::{StoreResource, Transfer};
use async_trait::async_trait;
use std::sync::Arc;

/// A plugin that can synthesize content for some paths
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether this generator claims `path`
    fn can_process(&self, path: &str) -> bool;

    /// Whether group content for `path` must be merged from every member
    /// instead of taken from the first member that has it
    fn is_mergable(&self, _path: &str) -> bool {
        false
    }

    /// Content for `path` in a concrete store
    async fn generate_file_content(
        &self,
        _store: &ArtifactStore,
        _path: &str,
    ) -> DepotResult<Option<Transfer>> {
        Ok(None)
    }

    /// Content for `path` in a group, given its ordered concrete members
    async fn generate_group_file_content(
        &self,
        _group: &ArtifactStore,
        _members: &[ArtifactStore],
        _path: &str,
    ) -> DepotResult<Option<Transfer>> {
        Ok(None)
    }

    /// Synthetic entries to add to a concrete store's listing
    async fn generate_directory_content(
        &self,
        _store: &ArtifactStore,
        _path: &str,
        _existing: &[StoreResource],
    ) -> DepotResult<Vec<StoreResource>> {
        Ok(Vec::new())
    }

    /// Synthetic entries to add to a group's listing
    async fn generate_group_directory_content(
        &self,
        _group: &ArtifactStore,
        _members: &[ArtifactStore],
        _path: &str,
    ) -> DepotResult<Vec<StoreResource>> {
        Ok(Vec::new())
    }

    /// Called after content was written to `store`
    async fn handle_content_storage(
        &self,
        _store: &ArtifactStore,
        _path: &str,
        _transfer: &Transfer,
    ) -> DepotResult<()> {
        Ok(())
    }

    /// Called after content was deleted from `store`
    async fn handle_content_deletion(&self, _store: &ArtifactStore, _path: &str) -> DepotResult<()> {
        Ok(())
    }
}

/// Generators in registration order
#[derive(Clone, Default)]
pub struct Generators {
    generators: Vec<Arc<dyn ContentGenerator>>,
}

impl Generators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator after those already present
    pub fn register(mut self, generator: Arc<dyn ContentGenerator>) -> Self {
        self.generators.push(generator);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ContentGenerator>> {
        self.generators.iter()
    }

    /// First generator that claims `path`
    pub fn claiming(&self, path: &str) -> Option<&Arc<dyn ContentGenerator>> {
        self.generators.iter().find(|g| g.can_process(path))
    }

    /// Whether any claiming generator merges `path` across group members
    pub fn is_mergable(&self, path: &str) -> bool {
        self.generators
            .iter()
            .any(|g| g.can_process(path) && g.is_mergable(path))
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl std::fmt::Debug for Generators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.generators.iter().map(|g| g.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Suffix(&'static str, bool);

    #[async_trait]
    impl ContentGenerator for Suffix {
        fn name(&self) -> &'static str {
            self.0
        }

        fn can_process(&self, path: &str) -> bool {
            path.ends_with(self.0)
        }

        fn is_mergable(&self, _path: &str) -> bool {
            self.1
        }
    }

    #[test]
    fn claiming_respects_registration_order() {
        let generators = Generators::new()
            .register(Arc::new(Suffix(".sha256", false)))
            .register(Arc::new(Suffix("256", true)));

        assert_eq!(generators.claiming("a.jar.sha256").unwrap().name(), ".sha256");
        assert_eq!(generators.claiming("x256").unwrap().name(), "256");
        assert!(generators.claiming("a.jar").is_none());
    }

    #[test]
    fn mergable_requires_a_claiming_generator() {
        let generators = Generators::new().register(Arc::new(Suffix("versions.json", true)));
        assert!(generators.is_mergable("org/foo/versions.json"));
        assert!(!generators.is_mergable("org/foo/foo.jar"));
        assert_eq!(format!("{:?}", generators), "[\"versions.json\"]");
    }
}
