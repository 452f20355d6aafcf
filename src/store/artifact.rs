//! Store definitions
//!
//! Stores are serialized as flat JSON documents tagged by `type`:
//!
//! ```json
//! { "type": "group", "name": "public", "constituents": ["hosted:local", "remote:central"] }
//! ```

use crate::store::key::{StoreKey, StoreType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{trace, warn};

/// Type-specific part of a store definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreKind {
    Hosted,
    Remote {
        /// Upstream location content is proxied from
        url: String,
    },
    Group {
        /// Members in retrieval priority order
        #[serde(default)]
        constituents: Vec<StoreKey>,
    },
}

/// A hosted repository, remote proxy, or group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactStore {
    pub name: String,

    #[serde(flatten)]
    pub kind: StoreKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub disabled: bool,

    /// Restricts which paths this store may answer
    #[serde(default, rename = "path_mask_patterns", skip_serializing_if = "PathMask::is_empty")]
    pub path_mask: PathMask,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ArtifactStore {
    fn with_kind(name: impl Into<String>, kind: StoreKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            disabled: false,
            path_mask: PathMask::default(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn hosted(name: impl Into<String>) -> Self {
        Self::with_kind(name, StoreKind::Hosted)
    }

    pub fn remote(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_kind(name, StoreKind::Remote { url: url.into() })
    }

    pub fn group(name: impl Into<String>, constituents: Vec<StoreKey>) -> Self {
        Self::with_kind(name, StoreKind::Group { constituents })
    }

    /// Builder-style path mask
    pub fn with_path_mask<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_mask = PathMask::new(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Builder-style disabled flag
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn store_type(&self) -> StoreType {
        match self.kind {
            StoreKind::Hosted => StoreType::Hosted,
            StoreKind::Remote { .. } => StoreType::Remote,
            StoreKind::Group { .. } => StoreType::Group,
        }
    }

    pub fn key(&self) -> StoreKey {
        StoreKey::new(self.store_type(), self.name.clone())
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, StoreKind::Group { .. })
    }

    pub fn is_hosted(&self) -> bool {
        matches!(self.kind, StoreKind::Hosted)
    }

    /// Group members in declaration order; empty for concrete stores
    pub fn constituents(&self) -> &[StoreKey] {
        match &self.kind {
            StoreKind::Group { constituents } => constituents,
            _ => &[],
        }
    }

    /// Upstream URL for remote stores
    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            StoreKind::Remote { url } => Some(url),
            _ => None,
        }
    }

    /// Append a member to a group. No-op for concrete stores.
    pub fn add_constituent(&mut self, key: StoreKey) {
        if let StoreKind::Group { constituents } = &mut self.kind {
            if !constituents.contains(&key) {
                constituents.push(key);
            }
        }
    }

    /// Whether the store's path mask lets it answer for `path`.
    ///
    /// Groups are never masked; their members are checked individually.
    pub fn accepts_path(&self, path: &str) -> bool {
        if self.is_group() {
            return true;
        }
        let accepted = self.path_mask.accepts(path);
        if !accepted {
            trace!("{} masks out {}", self.key(), path);
        }
        accepted
    }
}

/// Path mask patterns
///
/// Each pattern matches either as a literal prefix of the path or as a regex
/// matching the whole path. An empty mask accepts everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PathMask {
    patterns: Vec<String>,
    compiled: OnceLock<Vec<Option<Regex>>>,
}

impl PathMask {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns,
            compiled: OnceLock::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn accepts(&self, path: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        let compiled = self.compiled.get_or_init(|| {
            self.patterns
                .iter()
                .map(|p| match Regex::new(&format!("^(?:{})$", p)) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!("Path mask pattern '{}' is not a valid regex, using it as a prefix only: {}", p, e);
                        None
                    }
                })
                .collect()
        });

        self.patterns
            .iter()
            .zip(compiled)
            .any(|(pattern, re)| {
                path.starts_with(pattern.as_str()) || re.as_ref().is_some_and(|re| re.is_match(path))
            })
    }
}

impl PartialEq for PathMask {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

impl From<Vec<String>> for PathMask {
    fn from(patterns: Vec<String>) -> Self {
        Self::new(patterns)
    }
}

impl From<PathMask> for Vec<String> {
    fn from(mask: PathMask) -> Self {
        mask.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_deserializes_with_ordered_constituents() {
        let json = r#"{"type":"group","name":"public","constituents":["hosted:local","remote:central"]}"#;
        let store: ArtifactStore = serde_json::from_str(json).unwrap();

        assert_eq!(store.key(), StoreKey::group("public"));
        assert_eq!(
            store.constituents(),
            &[StoreKey::hosted("local"), StoreKey::remote("central")]
        );
        assert!(!store.disabled);
    }

    #[test]
    fn remote_roundtrips_through_json() {
        let store = ArtifactStore::remote("central", "file:///srv/central")
            .with_path_mask(["org/"]);
        let json = serde_json::to_string(&store).unwrap();
        assert!(json.contains("\"type\":\"remote\""));
        assert!(json.contains("path_mask_patterns"));

        let back: ArtifactStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
        assert_eq!(back.url(), Some("file:///srv/central"));
    }

    #[test]
    fn empty_mask_accepts_everything() {
        let store = ArtifactStore::hosted("local");
        assert!(store.accepts_path("org/foo/1.0/foo-1.0.jar"));
    }

    #[test]
    fn mask_matches_prefix_or_regex() {
        let store = ArtifactStore::hosted("local").with_path_mask(["org/commonjava/", r".*\.pom"]);
        assert!(store.accepts_path("org/commonjava/util/1/util-1.jar"));
        assert!(store.accepts_path("com/example/a/1/a-1.pom"));
        assert!(!store.accepts_path("com/example/a/1/a-1.jar"));
    }

    #[test]
    fn invalid_regex_still_matches_as_prefix() {
        let mask = PathMask::new(vec!["org/[broken".to_string()]);
        assert!(mask.accepts("org/[broken/x"));
        assert!(!mask.accepts("com/x"));
    }

    #[test]
    fn groups_ignore_masks() {
        let group = ArtifactStore::group("public", vec![]).with_path_mask(["nothing/"]);
        assert!(group.accepts_path("org/foo"));
    }

    #[test]
    fn add_constituent_skips_duplicates() {
        let mut group = ArtifactStore::group("public", vec![StoreKey::hosted("a")]);
        group.add_constituent(StoreKey::hosted("a"));
        group.add_constituent(StoreKey::remote("b"));
        assert_eq!(group.constituents().len(), 2);
    }
}
