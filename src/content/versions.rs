//! Merged version lists
//!
//! A `versions.json` file holds a JSON array of version strings. In a group
//! the file is the union of every member's list, so it is mergable: it is
//! never taken from a single member, and it is rebuilt on every group
//! request and written into the group's own storage.

use crate::content::ContentGenerator;
use crate::error::DepotResult;
use crate::store::ArtifactStore;
use crate::transfer::{Transfer, TransferManager};
use async_trait::async_trait;
use semver::Version;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

const FILE_NAME: &str = "versions.json";

/// Merges `versions.json` across group members
pub struct VersionListMerger {
    transfers: Arc<dyn TransferManager>,
}

impl VersionListMerger {
    pub fn new(transfers: Arc<dyn TransferManager>) -> Self {
        Self { transfers }
    }

    async fn read_member(&self, member: &ArtifactStore, path: &str) -> DepotResult<Option<Vec<String>>> {
        let Some(transfer) = self.transfers.retrieve(member, path).await? else {
            return Ok(None);
        };
        let versions = serde_json::from_slice(&transfer.read().await?)?;
        Ok(Some(versions))
    }
}

fn is_version_list(path: &str) -> bool {
    path == FILE_NAME || path.ends_with(&format!("/{}", FILE_NAME))
}

/// Semantic versions in ascending order, then everything else lexically
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Union of version lists, sorted
pub fn merge_versions<I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let unique: BTreeSet<String> = lists.into_iter().flatten().collect();
    let mut merged: Vec<String> = unique.into_iter().collect();
    merged.sort_by(|a, b| compare_versions(a, b));
    merged
}

#[async_trait]
impl ContentGenerator for VersionListMerger {
    fn name(&self) -> &'static str {
        "versions"
    }

    fn can_process(&self, path: &str) -> bool {
        is_version_list(path)
    }

    fn is_mergable(&self, path: &str) -> bool {
        is_version_list(path)
    }

    async fn generate_group_file_content(
        &self,
        group: &ArtifactStore,
        members: &[ArtifactStore],
        path: &str,
    ) -> DepotResult<Option<Transfer>> {
        let mut lists = Vec::new();
        for member in members {
            if member.disabled || !member.accepts_path(path) {
                continue;
            }
            match self.read_member(member, path).await {
                Ok(Some(versions)) => lists.push(versions),
                Ok(None) => {}
                Err(e) => warn!("Skipping {} from {}: {}", path, member.key(), e),
            }
        }

        if lists.is_empty() {
            return Ok(None);
        }

        let contributors = lists.len();
        let merged = merge_versions(lists);
        let transfer = self
            .transfers
            .store(group, path, &serde_json::to_vec_pretty(&merged)?)
            .await?;
        debug!(
            "Merged {} versions from {} members into {}",
            merged.len(),
            contributors,
            transfer
        );
        Ok(Some(transfer))
    }
}
