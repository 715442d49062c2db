use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use super::daily_aggregator::aggregate_daily_totals;
use super::fund_metrics::summarize;
use super::fund_model::{FundHistoryPoint, FundSummary, RecomputeOutcome};
use super::fund_traits::{FundHistoryRepositoryTrait, FundServiceTrait, RecomputeTrigger};
use super::nav_engine::compute_fund_history;
use crate::cashflows::{net_external_flows_by_date, CashflowRepositoryTrait};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::fx::{normalize_valuations, FxServiceTrait};
use crate::settings::SettingsServiceTrait;
use crate::snapshots::SnapshotRepositoryTrait;

/// Read-through cache of stored series, one slot per owner.
///
/// Each slot carries a generation bumped on invalidation, so a reader that
/// loaded rows before a rebuild committed cannot repopulate the slot with
/// them afterwards.
#[derive(Default)]
struct HistoryCache {
    slots: DashMap<String, (u64, Option<Arc<Vec<FundHistoryPoint>>>)>,
}

impl HistoryCache {
    fn get(&self, owner_id: &str) -> (u64, Option<Arc<Vec<FundHistoryPoint>>>) {
        self.slots
            .get(owner_id)
            .map(|slot| (slot.0, slot.1.clone()))
            .unwrap_or((0, None))
    }

    fn fill(&self, owner_id: &str, generation: u64, points: Arc<Vec<FundHistoryPoint>>) {
        let mut slot = self
            .slots
            .entry(owner_id.to_string())
            .or_insert((generation, None));
        if slot.0 == generation {
            slot.1 = Some(points);
        }
    }

    fn invalidate(&self, owner_id: &str) {
        let mut slot = self.slots.entry(owner_id.to_string()).or_insert((0, None));
        slot.0 += 1;
        slot.1 = None;
    }
}

/// Owns the derived fund series: rebuilds it on request and serves it.
///
/// Rebuilds of one owner are serialized through a per-owner lock held across
/// read, compute and replace; different owners rebuild independently.
pub struct FundService {
    fund_repository: Arc<dyn FundHistoryRepositoryTrait>,
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    cashflow_repository: Arc<dyn CashflowRepositoryTrait>,
    fx_service: Arc<dyn FxServiceTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    owner_locks: DashMap<String, Arc<Mutex<()>>>,
    cache: HistoryCache,
}

impl FundService {
    pub fn new(
        fund_repository: Arc<dyn FundHistoryRepositoryTrait>,
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        cashflow_repository: Arc<dyn CashflowRepositoryTrait>,
        fx_service: Arc<dyn FxServiceTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            fund_repository,
            snapshot_repository,
            cashflow_repository,
            fx_service,
            settings_service,
            event_sink,
            owner_locks: DashMap::new(),
            cache: HistoryCache::default(),
        }
    }

    fn owner_lock(&self, owner_id: &str) -> Arc<Mutex<()>> {
        self.owner_locks
            .entry(owner_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn rebuild(&self, owner_id: &str) -> Result<RecomputeOutcome> {
        let valuations = self.snapshot_repository.get_valuations_for_owner(owner_id)?;
        if valuations.is_empty() {
            debug!("No snapshots for {}; nothing to recompute", owner_id);
            return Ok(RecomputeOutcome::no_data(owner_id));
        }

        let base_currency = self.settings_service.get_base_currency()?;
        let rates = self.fx_service.build_rate_table(&base_currency)?;
        let normalized = normalize_valuations(&valuations, &rates)?;
        let daily_totals = aggregate_daily_totals(&normalized.valuations)?;

        let events = self.cashflow_repository.list_by_owner(owner_id)?;
        let net_flows = net_external_flows_by_date(&events)?;

        let points = compute_fund_history(owner_id, &daily_totals, &net_flows)?;
        let row_count = self
            .fund_repository
            .replace_history(owner_id, points)
            .await?;

        Ok(RecomputeOutcome::completed(
            owner_id,
            row_count,
            normalized.degraded,
        ))
    }

    fn cached_history(&self, owner_id: &str) -> Result<Arc<Vec<FundHistoryPoint>>> {
        let (generation, cached) = self.cache.get(owner_id);
        if let Some(points) = cached {
            return Ok(points);
        }
        let points = Arc::new(self.fund_repository.get_history(owner_id, None, None)?);
        self.cache.fill(owner_id, generation, points.clone());
        Ok(points)
    }
}

fn in_range(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
}

#[async_trait]
impl RecomputeTrigger for FundService {
    async fn recompute(&self, owner_id: &str) -> RecomputeOutcome {
        let lock = self.owner_lock(owner_id);
        let _guard = lock.lock().await;
        let started = Instant::now();

        let result = self.rebuild(owner_id).await;
        self.cache.invalidate(owner_id);

        match result {
            Ok(outcome) => {
                info!(
                    "Recomputed fund series of {}: {} row(s) in {:?}",
                    owner_id,
                    outcome.row_count,
                    started.elapsed()
                );
                if outcome.row_count > 0 {
                    self.event_sink.emit(DomainEvent::fund_history_recomputed(
                        owner_id,
                        outcome.row_count,
                        outcome.degraded_rates.len(),
                    ));
                }
                outcome
            }
            Err(e) => {
                error!("Recompute failed for {}: {}", owner_id, e);
                RecomputeOutcome::failed(owner_id, e.to_string())
            }
        }
    }
}

#[async_trait]
impl FundServiceTrait for FundService {
    fn get_fund_history(
        &self,
        owner_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<FundHistoryPoint>> {
        let history = self.cached_history(owner_id)?;
        Ok(history
            .iter()
            .filter(|p| in_range(p.date, start_date, end_date))
            .cloned()
            .collect())
    }

    fn get_latest_point(&self, owner_id: &str) -> Result<Option<FundHistoryPoint>> {
        Ok(self.cached_history(owner_id)?.last().cloned())
    }

    fn get_fund_summary(
        &self,
        owner_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Option<FundSummary>> {
        let history = self.cached_history(owner_id)?;
        let window: Vec<FundHistoryPoint> = history
            .iter()
            .filter(|p| in_range(p.date, start_date, end_date))
            .cloned()
            .collect();
        Ok(summarize(owner_id, &history, &window))
    }

    fn invalidate_cache(&self, owner_id: &str) {
        self.cache.invalidate(owner_id);
    }
}
