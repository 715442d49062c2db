use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::fire_projection::project_fire;
use super::planning_model::{
    FireAssumptions, FireProjection, GroupHolding, LatestHoldings, RebalanceAdvice,
    RebalanceGrouping, RebalanceTarget,
};
use super::planning_traits::PlanningServiceTrait;
use super::rebalance::compute_rebalance;
use crate::assets::{Asset, AssetRepositoryTrait};
use crate::constants::REBALANCE_MIN_TRADE;
use crate::errors::Result;
use crate::fx::FxServiceTrait;
use crate::settings::SettingsServiceTrait;
use crate::snapshots::SnapshotRepositoryTrait;
use crate::utils::decimal_utils::checked;

pub struct PlanningService {
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    fx_service: Arc<dyn FxServiceTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
}

impl PlanningService {
    pub fn new(
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        fx_service: Arc<dyn FxServiceTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
    ) -> Self {
        Self {
            asset_repository,
            snapshot_repository,
            fx_service,
            settings_service,
        }
    }

    fn group_of<'a>(asset: &'a Asset, grouping: &'a RebalanceGrouping) -> Option<&'a str> {
        match grouping {
            RebalanceGrouping::AssetKind => Some(asset.kind.as_db_str()),
            RebalanceGrouping::Custom(groups) => groups.get(&asset.id).map(String::as_str),
        }
    }
}

impl PlanningServiceTrait for PlanningService {
    fn get_latest_holdings(&self, owner_id: &str) -> Result<LatestHoldings> {
        let Some(date) = self
            .snapshot_repository
            .get_snapshot_dates(owner_id)?
            .into_iter()
            .next()
        else {
            return Ok(LatestHoldings {
                date: None,
                total: Decimal::ZERO,
                by_asset: HashMap::new(),
            });
        };

        let currencies: HashMap<String, String> = self
            .asset_repository
            .list_by_owner(owner_id)?
            .into_iter()
            .map(|a| (a.id, a.currency))
            .collect();
        let base_currency = self.settings_service.get_base_currency()?;
        let rates = self.fx_service.build_rate_table(&base_currency)?;

        let mut total = Decimal::ZERO;
        let mut by_asset = HashMap::new();
        for snapshot in self.snapshot_repository.get_snapshots_for_date(owner_id, date)? {
            let currency = currencies
                .get(&snapshot.asset_id)
                .map(String::as_str)
                .unwrap_or(base_currency.as_str());
            let (rate, degraded) = rates.rate_or_identity(currency, date);
            if degraded {
                warn!(
                    "No {} rate on or before {}; valuing {} at 1.0",
                    currency, date, snapshot.asset_id
                );
            }
            let value = checked(snapshot.amount.checked_mul(rate), "holding value", date)?;
            total = checked(total.checked_add(value), "holdings total", date)?;
            by_asset.insert(snapshot.asset_id, value);
        }

        Ok(LatestHoldings {
            date: Some(date),
            total,
            by_asset,
        })
    }

    fn project_fire(&self, owner_id: &str, assumptions: &FireAssumptions) -> Result<FireProjection> {
        let base_amount = match assumptions.base_amount {
            Some(amount) => amount,
            None => self.get_latest_holdings(owner_id)?.total,
        };
        project_fire(base_amount, assumptions)
    }

    fn get_rebalance_advice(
        &self,
        owner_id: &str,
        grouping: &RebalanceGrouping,
        targets: &[RebalanceTarget],
    ) -> Result<RebalanceAdvice> {
        let holdings = self.get_latest_holdings(owner_id)?;
        let assets = self.asset_repository.list_by_owner(owner_id)?;

        let mut group_holdings = Vec::new();
        for asset in &assets {
            let Some(value) = holdings.by_asset.get(&asset.id) else {
                continue;
            };
            match Self::group_of(asset, grouping) {
                Some(group) => group_holdings.push(GroupHolding {
                    group: group.to_string(),
                    amount: *value,
                }),
                None => debug!("Asset {} has no rebalance group; left out", asset.id),
            }
        }

        compute_rebalance(&group_holdings, targets, REBALANCE_MIN_TRADE)
    }
}
