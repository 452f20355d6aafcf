//! Direct content routing
//!
//! Routes every request straight to the stores involved, without consulting
//! the content index or the not-found cache. Groups are flattened through
//! the catalog on every call, so membership changes take effect
//! immediately.

use crate::catalog::StoreCatalog;
use crate::content::{dedupe_listing, ContentManager, Generators};
use crate::error::{DepotError, DepotResult};
use crate::store::{ArtifactStore, StoreKey};
use crate::transfer::{StoreResource, Transfer, TransferManager, TransferOperation};
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Content manager that routes requests directly to stores
pub struct DefaultContentManager {
    catalog: Arc<dyn StoreCatalog>,
    transfers: Arc<dyn TransferManager>,
    generators: Generators,
}

impl DefaultContentManager {
    pub fn new(
        catalog: Arc<dyn StoreCatalog>,
        transfers: Arc<dyn TransferManager>,
        generators: Generators,
    ) -> Self {
        Self {
            catalog,
            transfers,
            generators,
        }
    }

    async fn members(&self, group: &ArtifactStore) -> DepotResult<Vec<ArtifactStore>> {
        let members = self
            .catalog
            .ordered_concrete_stores_in_group(&group.name, false)
            .await?;
        debug!(
            "{} resolves to [{}]",
            group.key(),
            members
                .iter()
                .map(|m| m.key().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(members)
    }

    /// Retrieve from one concrete store. Location failures count as a miss.
    async fn do_retrieve(&self, store: &ArtifactStore, path: &str) -> DepotResult<Option<Transfer>> {
        if store.disabled {
            trace!("{} is disabled, skipping", store.key());
            return Ok(None);
        }
        if !store.accepts_path(path) {
            return Ok(None);
        }

        match self.fetch_concrete(store, path).await {
            Err(e) if e.is_location_error() => {
                warn!("{} could not answer for {}: {}", store.key(), path, e);
                Ok(None)
            }
            other => other,
        }
    }

    async fn fetch_concrete(&self, store: &ArtifactStore, path: &str) -> DepotResult<Option<Transfer>> {
        if let Some(transfer) = self.transfers.retrieve(store, path).await? {
            return Ok(Some(transfer));
        }

        for generator in self.generators.iter() {
            if let Some(transfer) = generator.generate_file_content(store, path).await? {
                debug!("{} generated {}", generator.name(), transfer);
                return Ok(Some(transfer));
            }
        }

        Ok(None)
    }

    /// Content from the first generator that claims `path` for a group.
    ///
    /// Returns `None` as the outer value when no generator claims the path.
    async fn generate_for_group(
        &self,
        group: &ArtifactStore,
        members: &[ArtifactStore],
        path: &str,
    ) -> Option<DepotResult<Option<Transfer>>> {
        let generator = self.generators.claiming(path)?;
        let generated = match generator
            .generate_group_file_content(group, members, path)
            .await
        {
            Err(e) if e.is_location_error() => {
                warn!("{} failed for {}:{}: {}", generator.name(), group.key(), path, e);
                Ok(None)
            }
            other => other,
        };
        debug!(
            "{} produced group content for {}:{}: {}",
            generator.name(),
            group.key(),
            path,
            matches!(generated, Ok(Some(_)))
        );
        Some(generated)
    }

    async fn concrete_exists(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool> {
        if store.disabled || !store.accepts_path(path) {
            return Ok(false);
        }
        match self.transfers.exists(store, path).await {
            Err(e) if e.is_location_error() => {
                warn!("{} could not answer for {}: {}", store.key(), path, e);
                Ok(false)
            }
            other => other,
        }
    }

    async fn list_concrete(&self, store: &ArtifactStore, path: &str) -> DepotResult<Vec<StoreResource>> {
        if store.disabled {
            return Ok(Vec::new());
        }

        let mut listed = self.transfers.list(store, path).await?;
        for generator in self.generators.iter() {
            let generated = generator
                .generate_directory_content(store, path, &listed)
                .await?;
            listed.extend(generated);
        }
        Ok(listed)
    }

    async fn list_group(&self, group: &ArtifactStore, path: &str) -> DepotResult<Vec<StoreResource>> {
        let members = self.members(group).await?;

        let mut listed = Vec::new();
        for generator in self.generators.iter() {
            match generator
                .generate_group_directory_content(group, &members, path)
                .await
            {
                Ok(generated) => listed.extend(generated),
                Err(e) => warn!("{} failed to list {}:{}: {}", generator.name(), group.key(), path, e),
            }
        }

        let listings = join_all(members.iter().map(|m| self.list_concrete(m, path))).await;
        for (member, listing) in members.iter().zip(listings) {
            match listing {
                Ok(entries) => listed.extend(entries),
                Err(e) => warn!("Failed to list {}:{}: {}", member.key(), path, e),
            }
        }

        Ok(listed)
    }

    /// First eligible upload target in `stores`
    fn storage_target<'a>(stores: &'a [ArtifactStore], path: &str) -> Option<&'a ArtifactStore> {
        stores
            .iter()
            .find(|s| s.is_hosted() && !s.disabled && s.accepts_path(path))
    }

    async fn notify_storage(&self, store: &ArtifactStore, path: &str, transfer: &Transfer) {
        for generator in self.generators.iter() {
            if let Err(e) = generator.handle_content_storage(store, path, transfer).await {
                warn!("{} failed to handle storage of {}: {}", generator.name(), transfer, e);
            }
        }
    }

    async fn notify_deletion(&self, store: &ArtifactStore, path: &str) {
        for generator in self.generators.iter() {
            if let Err(e) = generator.handle_content_deletion(store, path).await {
                warn!(
                    "{} failed to handle deletion of {}:{}: {}",
                    generator.name(),
                    store.key(),
                    path,
                    e
                );
            }
        }
    }
}

#[async_trait]
impl ContentManager for DefaultContentManager {
    async fn retrieve(&self, store: &ArtifactStore, path: &str) -> DepotResult<Option<Transfer>> {
        if !store.is_group() {
            return self.do_retrieve(store, path).await;
        }

        let members = self.members(store).await?;
        if let Some(generated) = self.generate_for_group(store, &members, path).await {
            return generated;
        }

        for member in &members {
            match self.do_retrieve(member, path).await {
                Ok(Some(transfer)) => {
                    info!("Returning {} for {}", transfer, store.key());
                    return Ok(Some(transfer));
                }
                Ok(None) => {}
                Err(e) => warn!(
                    "Failed to retrieve {} from {} in {}: {}",
                    path,
                    member.key(),
                    store.key(),
                    e
                ),
            }
        }

        debug!("No member of {} has {}", store.key(), path);
        Ok(None)
    }

    async fn retrieve_all(
        &self,
        stores: &[ArtifactStore],
        path: &str,
    ) -> DepotResult<Vec<Transfer>> {
        let mut found = Vec::new();

        for store in stores {
            if !store.is_group() {
                match self.do_retrieve(store, path).await {
                    Ok(Some(transfer)) => found.push(transfer),
                    Ok(None) => {}
                    Err(e) => warn!("Failed to retrieve {} from {}: {}", path, store.key(), e),
                }
                continue;
            }

            let members = self.members(store).await?;
            match self.generate_for_group(store, &members, path).await {
                Some(Ok(Some(merged))) => {
                    found.push(merged);
                    continue;
                }
                Some(Err(e)) => warn!("Failed to generate {} for {}: {}", path, store.key(), e),
                Some(Ok(None)) | None => {}
            }

            let results = join_all(members.iter().map(|m| self.do_retrieve(m, path))).await;
            for (member, result) in members.iter().zip(results) {
                match result {
                    Ok(Some(transfer)) => found.push(transfer),
                    Ok(None) => {}
                    Err(e) => warn!("Failed to retrieve {} from {}: {}", path, member.key(), e),
                }
            }
        }

        Ok(found)
    }

    async fn store(
        &self,
        store: &ArtifactStore,
        path: &str,
        content: &[u8],
    ) -> DepotResult<Transfer> {
        if store.is_group() {
            let members = self.members(store).await?;
            let transfer = self.store_in(&members, &store.key(), path, content).await?;
            info!("Stored {} for {} in {}", path, store.key(), transfer.store_key());
            return Ok(transfer);
        }

        if !store.is_hosted() {
            return Err(DepotError::NotWritable(store.key()));
        }
        if !store.accepts_path(path) {
            return Err(DepotError::PathInvalid {
                path: path.to_string(),
                reason: format!("outside the path mask of {}", store.key()),
            });
        }

        info!("Storing {} in {}", path, store.key());
        let transfer = self.transfers.store(store, path, content).await?;
        self.notify_storage(store, path, &transfer).await;
        Ok(transfer)
    }

    async fn store_in(
        &self,
        stores: &[ArtifactStore],
        top_key: &StoreKey,
        path: &str,
        content: &[u8],
    ) -> DepotResult<Transfer> {
        let target = Self::storage_target(stores, path).ok_or_else(|| DepotError::NoStorageTarget {
            path: path.to_string(),
            candidates: if stores.is_empty() {
                "none".to_string()
            } else {
                stores
                    .iter()
                    .map(|s| s.key().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        })?;

        info!("Storing {} for {} in {}", path, top_key, target.key());
        let transfer = self.transfers.store(target, path, content).await?;
        self.notify_storage(target, path, &transfer).await;
        Ok(transfer)
    }

    async fn delete(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool> {
        if !store.is_group() {
            let deleted = self.transfers.delete(store, path).await?;
            if deleted {
                self.notify_deletion(store, path).await;
            }
            return Ok(deleted);
        }

        let members = self.members(store).await?;
        let mut deleted = false;
        for member in &members {
            match self.transfers.delete(member, path).await {
                Ok(true) => {
                    deleted = true;
                    self.notify_deletion(member, path).await;
                }
                Ok(false) => {}
                Err(e) => warn!("Failed to delete {} from {}: {}", path, member.key(), e),
            }
        }

        if deleted {
            self.notify_deletion(store, path).await;
        }
        Ok(deleted)
    }

    async fn list(&self, store: &ArtifactStore, path: &str) -> DepotResult<Vec<StoreResource>> {
        let listed = if store.is_group() {
            self.list_group(store, path).await?
        } else {
            self.list_concrete(store, path).await?
        };
        Ok(dedupe_listing(listed))
    }

    async fn list_all(
        &self,
        stores: &[ArtifactStore],
        path: &str,
    ) -> DepotResult<Vec<StoreResource>> {
        let listings = join_all(stores.iter().map(|s| self.list(s, path))).await;

        let mut listed = Vec::new();
        for (store, listing) in stores.iter().zip(listings) {
            match listing {
                Ok(entries) => listed.extend(entries),
                Err(e) => warn!("Failed to list {}:{}: {}", store.key(), path, e),
            }
        }
        Ok(dedupe_listing(listed))
    }

    async fn exists(&self, store: &ArtifactStore, path: &str) -> DepotResult<bool> {
        if !store.is_group() {
            return self.concrete_exists(store, path).await;
        }

        for member in self.members(store).await? {
            match self.concrete_exists(&member, path).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => warn!("Failed to check {} in {}: {}", path, member.key(), e),
            }
        }
        Ok(false)
    }

    async fn get_transfer(
        &self,
        store: &ArtifactStore,
        path: &str,
        op: TransferOperation,
    ) -> DepotResult<Option<Transfer>> {
        debug!("Getting transfer for {}:{} ({:?})", store.key(), path, op);
        if store.is_group() && !self.generators.is_mergable(path) {
            let members = self.members(store).await?;
            return self.get_transfer_first(&members, path, op).await;
        }

        if store.disabled || !store.accepts_path(path) {
            return Ok(None);
        }
        self.transfers.storage_reference(store, path).map(Some)
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
        if op == TransferOperation::Upload {
            return match Self::storage_target(stores, path) {
                Some(target) => self.transfers.storage_reference(target, path).map(Some),
                None => Ok(None),
            };
        }

        for store in stores {
            if store.is_group() || store.disabled || !store.accepts_path(path) {
                continue;
            }
            let reference = self.transfers.storage_reference(store, path)?;
            let present = match op {
                TransferOperation::Listing => reference.is_dir().await,
                _ => reference.exists().await,
            };
            if present {
                return Ok(Some(reference));
            }
        }
        Ok(None)
    }
}
