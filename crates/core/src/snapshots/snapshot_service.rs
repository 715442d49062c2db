use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::balance_method::derive_from_balance;
use super::snapshot_model::{BalanceEntry, EntryRow, SaveSnapshotsResult, Snapshot};
use super::snapshot_traits::{SnapshotRepositoryTrait, SnapshotServiceTrait};
use crate::assets::{Asset, AssetKind, AssetRepositoryTrait, HoldingUpdate};
use crate::constants::INITIAL_UNIT_NAV;
use crate::errors::{Error, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::fund::RecomputeTrigger;

pub struct SnapshotService {
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    recompute_trigger: Arc<dyn RecomputeTrigger>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl SnapshotService {
    pub fn new(
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        recompute_trigger: Arc<dyn RecomputeTrigger>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            snapshot_repository,
            asset_repository,
            recompute_trigger,
            event_sink,
        }
    }

    fn owned_assets(&self, owner_id: &str) -> Result<HashMap<String, Asset>> {
        Ok(self
            .asset_repository
            .list_by_owner(owner_id)?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect())
    }
}

/// Prefills one entry row: the day's own snapshot, else the latest earlier
/// one, else zero. Cash is always priced at one unit per share.
fn build_entry_row(
    asset: &Asset,
    on_date: Option<&Snapshot>,
    before_date: Option<&Snapshot>,
    latest: Option<&Snapshot>,
) -> EntryRow {
    let source = on_date.or(before_date);
    let (amount, profit, mut unit_nav) = source
        .map(|s| (s.amount, s.profit, s.unit_nav))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO, INITIAL_UNIT_NAV));
    if asset.kind == AssetKind::Cash {
        unit_nav = Decimal::ONE;
    }
    let is_cleared = on_date.or(latest).map_or(false, |s| s.is_cleared);

    EntryRow {
        asset_id: asset.id.clone(),
        name: asset.name.clone(),
        code: asset.code.clone(),
        kind: asset.kind,
        currency: asset.currency.clone(),
        amount,
        profit,
        unit_nav,
        is_cleared,
        has_snapshot: on_date.is_some(),
        preview: derive_from_balance(amount, profit, unit_nav),
    }
}

#[async_trait]
impl SnapshotServiceTrait for SnapshotService {
    fn get_entry_rows(
        &self,
        owner_id: &str,
        date: NaiveDate,
        include_cleared: bool,
    ) -> Result<Vec<EntryRow>> {
        let assets = self.asset_repository.list_by_owner(owner_id)?;
        let on_date: HashMap<String, Snapshot> = self
            .snapshot_repository
            .get_snapshots_for_date(owner_id, date)?
            .into_iter()
            .map(|s| (s.asset_id.clone(), s))
            .collect();
        let before_date = self
            .snapshot_repository
            .get_latest_snapshots_before(owner_id, date)?;
        let latest = self.snapshot_repository.get_latest_snapshots(owner_id)?;

        Ok(assets
            .iter()
            .map(|asset| {
                build_entry_row(
                    asset,
                    on_date.get(&asset.id),
                    before_date.get(&asset.id),
                    latest.get(&asset.id),
                )
            })
            .filter(|row| include_cleared || !row.is_cleared)
            .collect())
    }

    fn get_snapshots(&self, owner_id: &str, date: NaiveDate) -> Result<Vec<Snapshot>> {
        self.snapshot_repository
            .get_snapshots_for_date(owner_id, date)
    }

    fn get_snapshot_dates(&self, owner_id: &str) -> Result<Vec<NaiveDate>> {
        self.snapshot_repository.get_snapshot_dates(owner_id)
    }

    async fn save_balance_entries(
        &self,
        owner_id: &str,
        date: NaiveDate,
        entries: Vec<BalanceEntry>,
    ) -> Result<SaveSnapshotsResult> {
        if entries.is_empty() {
            return Err(ValidationError::InvalidInput(format!(
                "no balance entries to save for {} on {}",
                owner_id, date
            ))
            .into());
        }

        let assets = self.owned_assets(owner_id)?;
        let mut seen = HashSet::new();
        let mut snapshots = Vec::with_capacity(entries.len());
        let mut holdings = Vec::with_capacity(entries.len());

        for entry in &entries {
            entry.validate()?;
            if !assets.contains_key(&entry.asset_id) {
                return Err(Error::Asset(format!(
                    "asset {} does not belong to owner {}",
                    entry.asset_id, owner_id
                )));
            }
            if !seen.insert(entry.asset_id.as_str()) {
                return Err(ValidationError::InvalidInput(format!(
                    "asset {} appears more than once in the batch",
                    entry.asset_id
                ))
                .into());
            }

            let snapshot = Snapshot::from_balance_entry(entry, date);
            let derived = derive_from_balance(entry.amount, entry.profit, entry.unit_nav);
            holdings.push(HoldingUpdate {
                asset_id: entry.asset_id.clone(),
                last_shares: snapshot.shares,
                unit_cost: derived.unit_cost,
            });
            snapshots.push(snapshot);
        }

        let asset_ids: Vec<String> = snapshots.iter().map(|s| s.asset_id.clone()).collect();
        let saved = self
            .snapshot_repository
            .save_balance_entries(snapshots, holdings)
            .await?;
        debug!(
            "Saved {} balance entr(ies) for {} on {}",
            saved, owner_id, date
        );
        self.event_sink.emit(DomainEvent::snapshots_changed(
            owner_id,
            asset_ids,
            vec![date],
        ));

        let recompute = self
            .recompute_trigger
            .recompute(owner_id)
            .await
            .into_result()?;
        Ok(SaveSnapshotsResult { saved, recompute })
    }

    async fn delete_snapshots_for_date(&self, owner_id: &str, date: NaiveDate) -> Result<usize> {
        let deleted = self
            .snapshot_repository
            .delete_snapshots_for_date(owner_id, date)
            .await?;
        if deleted == 0 {
            return Ok(0);
        }
        self.event_sink
            .emit(DomainEvent::snapshots_changed(owner_id, vec![], vec![date]));
        self.recompute_trigger
            .recompute(owner_id)
            .await
            .into_result()?;
        Ok(deleted)
    }
}
