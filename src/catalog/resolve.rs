//! Group membership resolution
//!
//! Flattens a group into the ordered list of stores it reads from:
//! 1. Members are visited in declaration order.
//! 2. A nested group's members are spliced in right after the nested
//!    group's own position, before its later siblings.
//! 3. Every key is visited at most once, so cycles and diamonds terminate.
//!
//! Traversal uses an explicit work queue instead of recursion.

use crate::catalog::StoreCatalog;
use crate::error::DepotResult;
use crate::store::{ArtifactStore, StoreKey, StoreType};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, trace, warn};

/// Resolve the ordered membership of the group named `group_name`.
///
/// An unknown group resolves to an empty list. Members whose definitions are
/// missing, or fail to load, are skipped.
pub async fn ordered_members<C>(
    catalog: &C,
    group_name: &str,
    include_groups: bool,
) -> DepotResult<Vec<ArtifactStore>>
where
    C: StoreCatalog + ?Sized,
{
    let root_key = StoreKey::group(group_name);
    let Some(root) = catalog.get_artifact_store(&root_key).await? else {
        debug!("Group {} not found, resolving to no members", root_key);
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    seen.insert(root_key);

    let mut pending: VecDeque<StoreKey> = root.constituents().iter().cloned().collect();
    let mut result = Vec::new();
    if include_groups {
        result.push(root);
    }

    while let Some(key) = pending.pop_front() {
        if !seen.insert(key.clone()) {
            trace!("Skipping already visited member {}", key);
            continue;
        }

        let store = match catalog.get_artifact_store(&key).await {
            Ok(Some(store)) => store,
            Ok(None) => {
                debug!("Member {} of group:{} has no definition, skipping", key, group_name);
                continue;
            }
            Err(e) => {
                warn!("Failed to look up member {} of group:{}: {}", key, group_name, e);
                continue;
            }
        };

        if store.is_group() {
            // Push in reverse so the children come out in declaration order.
            for child in store.constituents().iter().rev() {
                if !seen.contains(child) {
                    pending.push_front(child.clone());
                }
            }
            if include_groups {
                result.push(store);
            }
        } else {
            result.push(store);
        }
    }

    Ok(result)
}

/// Find every group whose membership reaches `key`, sorted by key.
pub async fn groups_containing<C>(catalog: &C, key: &StoreKey) -> DepotResult<Vec<ArtifactStore>>
where
    C: StoreCatalog + ?Sized,
{
    let groups = catalog.all_stores(Some(StoreType::Group)).await?;
    let mut result = Vec::new();

    for group in groups {
        if &group.key() == key {
            continue;
        }
        if reaches(catalog, &group, key).await? {
            result.push(group);
        }
    }

    result.sort_by_key(|g| g.key());
    Ok(result)
}

async fn reaches<C>(catalog: &C, group: &ArtifactStore, target: &StoreKey) -> DepotResult<bool>
where
    C: StoreCatalog + ?Sized,
{
    let mut seen = HashSet::new();
    seen.insert(group.key());
    let mut pending: VecDeque<StoreKey> = group.constituents().iter().cloned().collect();

    while let Some(key) = pending.pop_front() {
        if &key == target {
            return Ok(true);
        }
        if !key.is_group() || !seen.insert(key.clone()) {
            continue;
        }
        if let Some(nested) = catalog.get_artifact_store(&key).await? {
            pending.extend(nested.constituents().iter().cloned());
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryStoreCatalog;

    fn keys(stores: &[ArtifactStore]) -> Vec<String> {
        stores.iter().map(|s| s.key().to_string()).collect()
    }

    #[tokio::test]
    async fn nested_members_follow_their_group() {
        let catalog = MemoryStoreCatalog::with_stores([
            ArtifactStore::hosted("test"),
            ArtifactStore::remote("test", "file:///srv/test"),
            ArtifactStore::remote("first", "file:///srv/first"),
            ArtifactStore::remote("second", "file:///srv/second"),
            ArtifactStore::group(
                "test",
                vec![
                    StoreKey::hosted("test"),
                    StoreKey::remote("test"),
                    StoreKey::group("nested"),
                ],
            ),
            ArtifactStore::group(
                "nested",
                vec![StoreKey::remote("first"), StoreKey::remote("second")],
            ),
        ]);

        let members = ordered_members(&catalog, "test", false).await.unwrap();
        assert_eq!(
            keys(&members),
            ["hosted:test", "remote:test", "remote:first", "remote:second"]
        );
    }

    #[tokio::test]
    async fn splices_children_before_later_siblings() {
        let catalog = MemoryStoreCatalog::with_stores([
            ArtifactStore::hosted("a"),
            ArtifactStore::hosted("b"),
            ArtifactStore::hosted("c"),
            ArtifactStore::group("inner", vec![StoreKey::hosted("b")]),
            ArtifactStore::group(
                "outer",
                vec![StoreKey::group("inner"), StoreKey::hosted("c"), StoreKey::hosted("a")],
            ),
        ]);

        let members = ordered_members(&catalog, "outer", true).await.unwrap();
        assert_eq!(
            keys(&members),
            ["group:outer", "group:inner", "hosted:b", "hosted:c", "hosted:a"]
        );
    }

    #[tokio::test]
    async fn cycles_terminate_with_each_store_once() {
        let catalog = MemoryStoreCatalog::with_stores([
            ArtifactStore::hosted("x"),
            ArtifactStore::hosted("y"),
            ArtifactStore::group("a", vec![StoreKey::hosted("x"), StoreKey::group("b")]),
            ArtifactStore::group("b", vec![StoreKey::group("a"), StoreKey::hosted("y")]),
        ]);

        let members = ordered_members(&catalog, "a", true).await.unwrap();
        assert_eq!(keys(&members), ["group:a", "hosted:x", "group:b", "hosted:y"]);

        let concrete = ordered_members(&catalog, "b", false).await.unwrap();
        assert_eq!(keys(&concrete), ["hosted:x", "hosted:y"]);
    }

    #[tokio::test]
    async fn diamonds_are_deduplicated() {
        let catalog = MemoryStoreCatalog::with_stores([
            ArtifactStore::hosted("shared"),
            ArtifactStore::group("left", vec![StoreKey::hosted("shared")]),
            ArtifactStore::group("right", vec![StoreKey::hosted("shared")]),
            ArtifactStore::group("top", vec![StoreKey::group("left"), StoreKey::group("right")]),
        ]);

        let members = ordered_members(&catalog, "top", false).await.unwrap();
        assert_eq!(keys(&members), ["hosted:shared"]);
    }

    #[tokio::test]
    async fn unknown_group_is_empty() {
        let catalog = MemoryStoreCatalog::new();
        assert!(ordered_members(&catalog, "nope", true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_members_are_skipped() {
        let catalog = MemoryStoreCatalog::with_stores([
            ArtifactStore::hosted("present"),
            ArtifactStore::group(
                "g",
                vec![StoreKey::remote("gone"), StoreKey::hosted("present")],
            ),
        ]);

        let members = ordered_members(&catalog, "g", false).await.unwrap();
        assert_eq!(keys(&members), ["hosted:present"]);
    }

    #[tokio::test]
    async fn groups_containing_is_transitive() {
        let catalog = MemoryStoreCatalog::with_stores([
            ArtifactStore::hosted("local"),
            ArtifactStore::hosted("other"),
            ArtifactStore::group("inner", vec![StoreKey::hosted("local")]),
            ArtifactStore::group("outer", vec![StoreKey::group("inner")]),
            ArtifactStore::group("unrelated", vec![StoreKey::hosted("other")]),
            ArtifactStore::group("loop", vec![StoreKey::group("loop")]),
        ]);

        let groups = groups_containing(&catalog, &StoreKey::hosted("local")).await.unwrap();
        assert_eq!(keys(&groups), ["group:inner", "group:outer"]);
    }
}
