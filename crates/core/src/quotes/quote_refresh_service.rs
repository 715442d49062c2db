use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::errors::QuoteError;
use super::quote_traits::{fetch_unit_price, QuoteProviderTrait, QuoteRefreshServiceTrait};
use crate::assets::{Asset, AssetRepositoryTrait};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::fund::{RecomputeOutcome, RecomputeTrigger};
use crate::settings::SettingsServiceTrait;
use crate::snapshots::{value_from_units, Snapshot, SnapshotRepositoryTrait};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedAsset {
    pub asset_id: String,
    pub name: String,
    pub unit_nav: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRefresh {
    pub asset_id: String,
    pub name: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRefreshReport {
    pub date: NaiveDate,
    pub updated: Vec<RefreshedAsset>,
    /// Selected assets that are not auto-update, have no code, or are not quotable.
    pub skipped: Vec<String>,
    pub failed: Vec<FailedRefresh>,
    /// Present when at least one snapshot was written.
    pub recompute: Option<RecomputeOutcome>,
}

pub struct QuoteRefreshService {
    provider: Arc<dyn QuoteProviderTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
    recompute_trigger: Arc<dyn RecomputeTrigger>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl QuoteRefreshService {
    pub fn new(
        provider: Arc<dyn QuoteProviderTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
        recompute_trigger: Arc<dyn RecomputeTrigger>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            provider,
            asset_repository,
            snapshot_repository,
            settings_service,
            recompute_trigger,
            event_sink,
        }
    }

    /// Builds the day's snapshot of `asset` at `unit_nav`, keeping the share
    /// count of an existing snapshot when it has one.
    fn reprice(&self, asset: &Asset, date: NaiveDate, unit_nav: Decimal) -> Result<Snapshot> {
        let existing = self.snapshot_repository.get_snapshot(&asset.id, date)?;
        let shares = existing
            .as_ref()
            .map(|s| s.shares)
            .filter(|shares| *shares > Decimal::ZERO)
            .unwrap_or(asset.last_shares);
        let valuation = value_from_units(shares, unit_nav, asset.unit_cost);

        Ok(Snapshot {
            id: Snapshot::make_id(&asset.id, date),
            asset_id: asset.id.clone(),
            date,
            amount: valuation.amount,
            profit: valuation.profit,
            cost: valuation.cost,
            yield_rate: valuation.yield_rate,
            shares,
            unit_nav,
            is_cleared: existing.map_or(false, |s| s.is_cleared),
        })
    }
}

#[async_trait]
impl QuoteRefreshServiceTrait for QuoteRefreshService {
    async fn refresh_unit_navs(
        &self,
        owner_id: &str,
        date: NaiveDate,
        asset_ids: &[String],
    ) -> Result<QuoteRefreshReport> {
        let mut report = QuoteRefreshReport {
            date,
            updated: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            recompute: None,
        };
        if asset_ids.is_empty() {
            return Ok(report);
        }

        let timeout = self.settings_service.get_quote_timeout()?;
        let assets: HashMap<String, Asset> = self
            .asset_repository
            .list_by_owner(owner_id)?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();

        let mut snapshots = Vec::new();
        for asset_id in asset_ids {
            let Some(asset) = assets.get(asset_id) else {
                report.failed.push(FailedRefresh {
                    asset_id: asset_id.clone(),
                    name: None,
                    reason: format!("asset not found for owner {}", owner_id),
                });
                continue;
            };
            let code = match asset.code.as_deref() {
                Some(code) if asset.auto_update && asset.kind.is_quotable() => code,
                _ => {
                    report.skipped.push(asset.id.clone());
                    continue;
                }
            };

            let priced = fetch_unit_price(self.provider.as_ref(), code, asset.kind, date, timeout)
                .await
                .and_then(|price| match price {
                    Some(p) if p > Decimal::ZERO => Ok(p),
                    _ => Err(QuoteError::NotAvailable(code.to_string()).into()),
                })
                .and_then(|unit_nav| Ok((unit_nav, self.reprice(asset, date, unit_nav)?)));

            match priced {
                Ok((unit_nav, snapshot)) => {
                    debug!(
                        "Repriced {} ({}) at {} on {}",
                        asset.name, code, unit_nav, date
                    );
                    report.updated.push(RefreshedAsset {
                        asset_id: asset.id.clone(),
                        name: asset.name.clone(),
                        unit_nav,
                        amount: snapshot.amount,
                    });
                    snapshots.push(snapshot);
                }
                Err(e) => {
                    warn!("Quote refresh failed for {} ({}): {}", asset.name, code, e);
                    report.failed.push(FailedRefresh {
                        asset_id: asset.id.clone(),
                        name: Some(asset.name.clone()),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if snapshots.is_empty() {
            return Ok(report);
        }

        let changed: Vec<String> = snapshots.iter().map(|s| s.asset_id.clone()).collect();
        self.snapshot_repository.upsert_snapshots(snapshots).await?;
        self.event_sink
            .emit(DomainEvent::snapshots_changed(owner_id, changed, vec![date]));

        let outcome = self
            .recompute_trigger
            .recompute(owner_id)
            .await
            .into_result()?;
        report.recompute = Some(outcome);
        Ok(report)
    }
}
