//! SHA-256 checksum generation
//!
//! `foo.jar.sha256` is synthesized from `foo.jar` in the same store the
//! first time it is requested, then kept next to the artifact. Storing or
//! deleting the artifact drops the stale checksum.

use crate::content::ContentGenerator;
use crate::error::DepotResult;
use crate::store::ArtifactStore;
use crate::transfer::{StoreResource, Transfer, TransferManager};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

const SUFFIX: &str = ".sha256";

/// Generates `.sha256` files for stored artifacts
pub struct ChecksumGenerator {
    transfers: Arc<dyn TransferManager>,
}

impl ChecksumGenerator {
    pub fn new(transfers: Arc<dyn TransferManager>) -> Self {
        Self { transfers }
    }

    async fn checksum_from_member(
        &self,
        member: &ArtifactStore,
        path: &str,
    ) -> DepotResult<Option<Transfer>> {
        if let Some(existing) = self.transfers.retrieve(member, path).await? {
            return Ok(Some(existing));
        }
        self.generate_file_content(member, path).await
    }
}

/// Artifact path a checksum path refers to
fn artifact_path(path: &str) -> Option<&str> {
    path.strip_suffix(SUFFIX)
        .filter(|artifact| !artifact.is_empty() && !artifact.ends_with('/'))
}

fn checksum_path(artifact: &str) -> String {
    format!("{}{}", artifact, SUFFIX)
}

/// Lowercase hex SHA-256 of `content`
pub fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

#[async_trait]
impl ContentGenerator for ChecksumGenerator {
    fn name(&self) -> &'static str {
        "checksum"
    }

    fn can_process(&self, path: &str) -> bool {
        artifact_path(path).is_some()
    }

    async fn generate_file_content(
        &self,
        store: &ArtifactStore,
        path: &str,
    ) -> DepotResult<Option<Transfer>> {
        let Some(artifact) = artifact_path(path) else {
            return Ok(None);
        };
        let Some(source) = self.transfers.retrieve(store, artifact).await? else {
            return Ok(None);
        };

        let digest = sha256_hex(&source.read().await?);
        let transfer = self.transfers.store(store, path, digest.as_bytes()).await?;
        debug!("Generated checksum {}", transfer);
        Ok(Some(transfer))
    }

    async fn generate_group_file_content(
        &self,
        group: &ArtifactStore,
        members: &[ArtifactStore],
        path: &str,
    ) -> DepotResult<Option<Transfer>> {
        for member in members {
            if member.disabled || !member.accepts_path(path) {
                continue;
            }
            match self.checksum_from_member(member, path).await {
                Ok(Some(transfer)) => return Ok(Some(transfer)),
                Ok(None) => {}
                Err(e) => warn!(
                    "Checksum of {} unavailable from {} in {}: {}",
                    path,
                    member.key(),
                    group.key(),
                    e
                ),
            }
        }
        Ok(None)
    }

    async fn generate_directory_content(
        &self,
        store: &ArtifactStore,
        _path: &str,
        existing: &[StoreResource],
    ) -> DepotResult<Vec<StoreResource>> {
        let present: HashSet<&str> = existing.iter().map(|r| r.path.as_str()).collect();
        Ok(existing
            .iter()
            .filter(|r| !r.is_dir && !r.path.ends_with(SUFFIX))
            .map(|r| checksum_path(&r.path))
            .filter(|checksum| !present.contains(checksum.as_str()))
            .map(|checksum| StoreResource::file(store.key(), checksum))
            .collect())
    }

    async fn handle_content_storage(
        &self,
        store: &ArtifactStore,
        path: &str,
        _transfer: &Transfer,
    ) -> DepotResult<()> {
        if self.can_process(path) {
            return Ok(());
        }
        if self.transfers.delete(store, &checksum_path(path)).await? {
            debug!("Dropped stale checksum of {}:{}", store.key(), path);
        }
        Ok(())
    }

    async fn handle_content_deletion(&self, store: &ArtifactStore, path: &str) -> DepotResult<()> {
        if self.can_process(path) {
            return Ok(());
        }
        self.transfers.delete(store, &checksum_path(path)).await?;
        Ok(())
    }
}
