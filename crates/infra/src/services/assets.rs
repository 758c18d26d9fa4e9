use std::sync::Arc;

use chrono::{DateTime, Utc};

use innkeep_assets::{Asset, AssetDraft, AssetId, AssetStatus};
use innkeep_auth::{Permission, Principal, authorize};
use innkeep_core::{DomainError, DomainResult};

use crate::error::ServiceError;
use crate::services::position_of;
use crate::snapshot::{Persistence, Snapshot};

pub struct AssetService {
    persistence: Arc<Persistence>,
    assets: Snapshot<Asset>,
}

impl AssetService {
    pub fn new(persistence: Arc<Persistence>, assets: Snapshot<Asset>) -> Self {
        Self { persistence, assets }
    }

    pub fn list(&self, principal: &Principal) -> Result<Vec<Asset>, ServiceError> {
        authorize(principal, &Permission::ASSETS_READ)?;
        Ok(self.assets.all()?)
    }

    pub fn available(&self, principal: &Principal) -> Result<Vec<Asset>, ServiceError> {
        authorize(principal, &Permission::ASSETS_READ)?;
        Ok(self
            .assets
            .read()?
            .iter()
            .filter(|a| a.status == AssetStatus::Available)
            .cloned()
            .collect())
    }

    pub fn get(&self, principal: &Principal, id: AssetId) -> Result<Asset, ServiceError> {
        authorize(principal, &Permission::ASSETS_READ)?;
        self.find(id)?.ok_or_else(|| DomainError::not_found("asset").into())
    }

    pub fn create(&self, principal: &Principal, draft: AssetDraft) -> Result<Asset, ServiceError> {
        authorize(principal, &Permission::ASSETS_WRITE)?;
        let asset = draft.into_asset(AssetId::generate(), Utc::now())?;

        self.assets.mutate(&self.persistence, |assets| {
            if let Some(serial) = &asset.serial_number {
                if assets.iter().any(|a| a.serial_number.as_ref() == Some(serial)) {
                    return Err(DomainError::conflict(format!("serial number '{serial}' is already registered")).into());
                }
            }
            assets.push(asset.clone());
            Ok::<_, ServiceError>(())
        })?;

        tracing::info!(asset_id = %asset.id, name = %asset.name, by = %principal.display_name, "asset registered");
        Ok(asset)
    }

    pub fn update(&self, principal: &Principal, id: AssetId, draft: AssetDraft) -> Result<Asset, ServiceError> {
        authorize(principal, &Permission::ASSETS_WRITE)?;
        let asset = self.change(id, |asset| draft.apply_to(asset, Utc::now()))?;
        tracing::info!(asset_id = %id, by = %principal.display_name, "asset updated");
        Ok(asset)
    }

    /// Checked-out assets must come back before they can be deleted.
    pub fn delete(&self, principal: &Principal, id: AssetId) -> Result<(), ServiceError> {
        authorize(principal, &Permission::ASSETS_WRITE)?;
        self.assets.mutate(&self.persistence, |assets| {
            let idx = position_of(assets, &id, "asset")?;
            if assets[idx].status == AssetStatus::CheckedOut {
                return Err(DomainError::invariant("checked-out assets cannot be deleted").into());
            }
            assets.remove(idx);
            Ok::<_, ServiceError>(())
        })?;
        tracing::info!(asset_id = %id, by = %principal.display_name, "asset deleted");
        Ok(())
    }

    pub fn check_out(&self, principal: &Principal, id: AssetId, to: &str) -> Result<Asset, ServiceError> {
        authorize(principal, &Permission::ASSETS_CHECKOUT)?;
        let asset = self.check_out_unchecked(id, to, Utc::now())?;
        tracing::info!(asset_id = %id, to = %to, by = %principal.display_name, "asset checked out");
        Ok(asset)
    }

    pub fn check_in(&self, principal: &Principal, id: AssetId) -> Result<Asset, ServiceError> {
        authorize(principal, &Permission::ASSETS_CHECKOUT)?;
        let asset = self.change(id, |asset| asset.check_in(Utc::now()))?;
        tracing::info!(asset_id = %id, by = %principal.display_name, "asset checked in");
        Ok(asset)
    }

    pub fn start_maintenance(&self, principal: &Principal, id: AssetId) -> Result<Asset, ServiceError> {
        authorize(principal, &Permission::ASSETS_WRITE)?;
        let asset = self.change(id, |asset| asset.start_maintenance(Utc::now()))?;
        tracing::info!(asset_id = %id, by = %principal.display_name, "asset sent to maintenance");
        Ok(asset)
    }

    pub fn finish_maintenance(&self, principal: &Principal, id: AssetId) -> Result<Asset, ServiceError> {
        authorize(principal, &Permission::ASSETS_WRITE)?;
        let asset = self.change(id, |asset| asset.finish_maintenance(Utc::now()))?;
        tracing::info!(asset_id = %id, by = %principal.display_name, "asset back from maintenance");
        Ok(asset)
    }

    pub fn retire(&self, principal: &Principal, id: AssetId) -> Result<Asset, ServiceError> {
        authorize(principal, &Permission::ASSETS_WRITE)?;
        let asset = self.change(id, |asset| asset.retire(Utc::now()))?;
        tracing::info!(asset_id = %id, by = %principal.display_name, "asset retired");
        Ok(asset)
    }

    /// Checkout on behalf of an already-authorized workflow (request fulfilment).
    pub(crate) fn check_out_unchecked(
        &self,
        id: AssetId,
        to: &str,
        at: DateTime<Utc>,
    ) -> Result<Asset, ServiceError> {
        self.change(id, |asset| asset.check_out(to, at))
    }

    /// Put an asset back as it was before a hand-over that did not commit.
    pub(crate) fn restore(&self, before: Asset) -> Result<(), ServiceError> {
        let id = before.id;
        self.assets.mutate(&self.persistence, |assets| {
            let idx = position_of(assets, &id, "asset")?;
            assets[idx] = before;
            Ok::<_, ServiceError>(())
        })?;
        tracing::warn!(asset_id = %id, "asset hand-over reverted");
        Ok(())
    }

    pub(crate) fn find(&self, id: AssetId) -> Result<Option<Asset>, ServiceError> {
        Ok(self.assets.read()?.iter().find(|a| a.id == id).cloned())
    }

    pub(crate) fn reload(&self) -> Result<bool, ServiceError> {
        Ok(self.assets.reload(&self.persistence)?)
    }

    fn change(&self, id: AssetId, f: impl FnOnce(&mut Asset) -> DomainResult<()>) -> Result<Asset, ServiceError> {
        let result = self.assets.mutate(&self.persistence, |assets| {
            let idx = position_of(assets, &id, "asset")?;
            f(&mut assets[idx])?;
            Ok::<_, ServiceError>(assets[idx].clone())
        });
        if let Err(error) = &result {
            tracing::warn!(asset_id = %id, %error, "asset operation rejected");
        }
        result
    }
}
