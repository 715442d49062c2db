use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use super::snapshot_model::{
    BalanceEntry, EntryRow, SaveSnapshotsResult, Snapshot, SnapshotValuation,
};
use crate::assets::HoldingUpdate;
use crate::errors::Result;

#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// Every snapshot amount of an owner with its asset's currency, ordered
    /// by date then asset.
    fn get_valuations_for_owner(&self, owner_id: &str) -> Result<Vec<SnapshotValuation>>;

    fn get_snapshots_for_date(&self, owner_id: &str, date: NaiveDate) -> Result<Vec<Snapshot>>;

    /// Per asset, the most recent snapshot strictly before `date`.
    fn get_latest_snapshots_before(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<HashMap<String, Snapshot>>;

    /// Per asset, the most recent snapshot on any date.
    fn get_latest_snapshots(&self, owner_id: &str) -> Result<HashMap<String, Snapshot>>;

    fn get_snapshot(&self, asset_id: &str, date: NaiveDate) -> Result<Option<Snapshot>>;

    /// Distinct snapshot dates of an owner, newest first.
    fn get_snapshot_dates(&self, owner_id: &str) -> Result<Vec<NaiveDate>>;

    /// Upserts the snapshots and applies the holding updates in one transaction.
    async fn save_balance_entries(
        &self,
        snapshots: Vec<Snapshot>,
        holdings: Vec<HoldingUpdate>,
    ) -> Result<usize>;

    /// Inserts or replaces snapshots by (asset, date).
    async fn upsert_snapshots(&self, snapshots: Vec<Snapshot>) -> Result<usize>;

    async fn delete_snapshots_for_date(&self, owner_id: &str, date: NaiveDate) -> Result<usize>;
}

#[async_trait]
pub trait SnapshotServiceTrait: Send + Sync {
    /// Prefilled entry rows for every asset of the owner on `date`.
    fn get_entry_rows(
        &self,
        owner_id: &str,
        date: NaiveDate,
        include_cleared: bool,
    ) -> Result<Vec<EntryRow>>;

    fn get_snapshots(&self, owner_id: &str, date: NaiveDate) -> Result<Vec<Snapshot>>;

    fn get_snapshot_dates(&self, owner_id: &str) -> Result<Vec<NaiveDate>>;

    /// Reverse-calculates and saves a batch of balance entries, then rebuilds
    /// the owner's fund series.
    async fn save_balance_entries(
        &self,
        owner_id: &str,
        date: NaiveDate,
        entries: Vec<BalanceEntry>,
    ) -> Result<SaveSnapshotsResult>;

    /// Removes every snapshot of the owner on `date`, then rebuilds.
    async fn delete_snapshots_for_date(&self, owner_id: &str, date: NaiveDate) -> Result<usize>;
}
