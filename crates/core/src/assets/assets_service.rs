use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use super::assets_model::{Asset, AssetUpdate, NewAsset};
use super::assets_traits::{AssetRepositoryTrait, AssetServiceTrait};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::fund::RecomputeTrigger;

pub struct AssetService {
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    recompute_trigger: Arc<dyn RecomputeTrigger>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl AssetService {
    pub fn new(
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        recompute_trigger: Arc<dyn RecomputeTrigger>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            asset_repository,
            recompute_trigger,
            event_sink,
        }
    }
}

#[async_trait]
impl AssetServiceTrait for AssetService {
    fn get_asset(&self, asset_id: &str) -> Result<Asset> {
        self.asset_repository.get_by_id(asset_id)
    }

    fn get_assets(&self, owner_id: &str) -> Result<Vec<Asset>> {
        self.asset_repository.list_by_owner(owner_id)
    }

    async fn create_asset(&self, new_asset: NewAsset) -> Result<Asset> {
        new_asset.validate()?;
        let asset = self.asset_repository.create(new_asset.normalized()).await?;
        debug!("Created asset {} for owner {}", asset.id, asset.owner_id);
        self.event_sink.emit(DomainEvent::assets_changed(
            asset.owner_id.clone(),
            vec![asset.id.clone()],
        ));
        Ok(asset)
    }

    async fn update_asset(&self, update: AssetUpdate) -> Result<Asset> {
        update.validate()?;
        let update = update.normalized();
        let existing = self.asset_repository.get_by_id(&update.id)?;
        let currency_changed = existing.currency != update.currency;

        let asset = self.asset_repository.update(update).await?;
        self.event_sink.emit(DomainEvent::assets_changed(
            asset.owner_id.clone(),
            vec![asset.id.clone()],
        ));

        if currency_changed {
            debug!(
                "Currency of asset {} changed {} -> {}; rebuilding fund series",
                asset.id, existing.currency, asset.currency
            );
            self.recompute_trigger
                .recompute(&asset.owner_id)
                .await
                .into_result()?;
        }
        Ok(asset)
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<()> {
        let asset = self.asset_repository.get_by_id(asset_id)?;
        let removed_snapshots = self.asset_repository.delete(asset_id).await?;
        debug!(
            "Deleted asset {} with {} snapshot(s)",
            asset_id, removed_snapshots
        );
        self.event_sink.emit(DomainEvent::assets_changed(
            asset.owner_id.clone(),
            vec![asset.id.clone()],
        ));

        self.recompute_trigger
            .recompute(&asset.owner_id)
            .await
            .into_result()?;
        Ok(())
    }
}
