use async_trait::async_trait;

use super::assets_model::{Asset, AssetUpdate, NewAsset};
use crate::errors::Result;

#[async_trait]
pub trait AssetRepositoryTrait: Send + Sync {
    async fn create(&self, new_asset: NewAsset) -> Result<Asset>;

    async fn update(&self, update: AssetUpdate) -> Result<Asset>;

    /// Deletes the asset together with all of its snapshots.
    async fn delete(&self, asset_id: &str) -> Result<usize>;

    fn get_by_id(&self, asset_id: &str) -> Result<Asset>;

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Asset>>;

    /// Distinct owners that hold at least one asset.
    fn list_owner_ids(&self) -> Result<Vec<String>>;
}

#[async_trait]
pub trait AssetServiceTrait: Send + Sync {
    fn get_asset(&self, asset_id: &str) -> Result<Asset>;

    fn get_assets(&self, owner_id: &str) -> Result<Vec<Asset>>;

    async fn create_asset(&self, new_asset: NewAsset) -> Result<Asset>;

    /// Updates an asset; a currency change rebuilds the owner's fund series.
    async fn update_asset(&self, update: AssetUpdate) -> Result<Asset>;

    /// Deletes an asset and its snapshots, then rebuilds the owner's fund series.
    async fn delete_asset(&self, asset_id: &str) -> Result<()>;
}
