//! In-memory repositories and stubs shared by the service tests.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::assets::{Asset, AssetRepositoryTrait, AssetUpdate, HoldingUpdate, NewAsset};
use crate::cashflows::{CashflowEvent, CashflowRepositoryTrait, CashflowUpdate, NewCashflowEvent};
use crate::constants::setting_keys;
use crate::errors::{DatabaseError, Error, Result};
use crate::fund::{FundHistoryPoint, FundHistoryRepositoryTrait, RecomputeOutcome, RecomputeTrigger};
use crate::fx::{ExchangeRate, FxRepositoryTrait};
use crate::plans::{
    InvestmentPlan, InvestmentPlanUpdate, NewInvestmentPlan, PlanExecution, PlanRepositoryTrait,
};
use crate::quotes::QuoteProviderTrait;
use crate::settings::{Settings, SettingsRepositoryTrait, SettingsUpdate};
use crate::snapshots::{Snapshot, SnapshotRepositoryTrait, SnapshotValuation};
use crate::AssetKind;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[derive(Default)]
struct State {
    seq: u64,
    assets: BTreeMap<String, Asset>,
    snapshots: BTreeMap<(String, NaiveDate), Snapshot>,
    cashflows: BTreeMap<String, CashflowEvent>,
    rates: BTreeMap<(NaiveDate, String), Decimal>,
    history: HashMap<String, Vec<FundHistoryPoint>>,
    settings: HashMap<String, String>,
    plans: BTreeMap<String, InvestmentPlan>,
    executions: Vec<PlanExecution>,
    unreadable_snapshot_asset: Option<String>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.seq += 1;
        format!("{}-{}", prefix, self.seq)
    }

    fn timestamp(&self) -> NaiveDateTime {
        date("2024-01-01").and_hms_opt(0, 0, 0).unwrap() + Duration::seconds(self.seq as i64)
    }

    fn owner_of(&self, asset_id: &str) -> Option<&str> {
        self.assets.get(asset_id).map(|a| a.owner_id.as_str())
    }

    fn apply_holding(&mut self, holding: &HoldingUpdate) {
        if let Some(asset) = self.assets.get_mut(&holding.asset_id) {
            asset.last_shares = holding.last_shares;
            asset.unit_cost = holding.unit_cost;
        }
    }
}

fn not_found(what: &str, id: &str) -> Error {
    DatabaseError::NotFound(format!("{} {}", what, id)).into()
}

/// One store behind every repository trait, so services wired to it see each
/// other's writes the way they would through a shared database.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    pub fail_replace_history: AtomicBool,
    pub fail_record_execution: AtomicBool,
    pub replace_calls: AtomicUsize,
    replaces_in_flight: AtomicUsize,
    pub max_replaces_in_flight: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn add_asset(&self, id: &str, owner_id: &str, kind: AssetKind, currency: &str) -> Asset {
        let mut state = self.state();
        let now = state.timestamp();
        let asset = Asset {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: id.to_string(),
            code: None,
            kind,
            currency: currency.to_string(),
            auto_update: false,
            last_shares: Decimal::ZERO,
            unit_cost: Decimal::ZERO,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        state.assets.insert(id.to_string(), asset.clone());
        asset
    }

    /// Makes single-snapshot reads of `asset_id` fail.
    pub fn break_snapshot_reads(&self, asset_id: &str) {
        self.state().unreadable_snapshot_asset = Some(asset_id.to_string());
    }

    pub fn executions(&self) -> Vec<PlanExecution> {
        self.state().executions.clone()
    }

    pub fn put_asset(&self, asset: Asset) {
        self.state().assets.insert(asset.id.clone(), asset);
    }

    pub fn asset(&self, id: &str) -> Asset {
        self.state().assets.get(id).cloned().unwrap()
    }

    /// Stores a snapshot with only an amount, priced at 1.0 per share.
    pub fn add_valuation(&self, asset_id: &str, day: &str, amount: Decimal) {
        let d = date(day);
        self.put_snapshot(Snapshot {
            id: Snapshot::make_id(asset_id, d),
            asset_id: asset_id.to_string(),
            date: d,
            amount,
            profit: Decimal::ZERO,
            cost: amount,
            yield_rate: Decimal::ZERO,
            shares: amount,
            unit_nav: Decimal::ONE,
            is_cleared: false,
        });
    }

    pub fn put_snapshot(&self, snapshot: Snapshot) {
        self.state()
            .snapshots
            .insert((snapshot.asset_id.clone(), snapshot.date), snapshot);
    }

    pub fn snapshot(&self, asset_id: &str, day: &str) -> Option<Snapshot> {
        self.state()
            .snapshots
            .get(&(asset_id.to_string(), date(day)))
            .cloned()
    }

    pub fn add_rate(&self, day: &str, currency: &str, rate: Decimal) {
        self.state()
            .rates
            .insert((date(day), currency.to_string()), rate);
    }

    pub fn cashflows(&self) -> Vec<CashflowEvent> {
        self.state().cashflows.values().cloned().collect()
    }

    pub fn stored_history(&self, owner_id: &str) -> Vec<FundHistoryPoint> {
        self.state()
            .history
            .get(owner_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl AssetRepositoryTrait for InMemoryStore {
    async fn create(&self, new_asset: NewAsset) -> Result<Asset> {
        let mut state = self.state();
        let id = match new_asset.id {
            Some(id) => id,
            None => state.next_id("asset"),
        };
        if state.assets.contains_key(&id) {
            return Err(DatabaseError::UniqueViolation(format!("asset {}", id)).into());
        }
        let now = state.timestamp();
        let asset = Asset {
            id: id.clone(),
            owner_id: new_asset.owner_id,
            name: new_asset.name,
            code: new_asset.code,
            kind: new_asset.kind,
            currency: new_asset.currency,
            auto_update: new_asset.auto_update,
            last_shares: Decimal::ZERO,
            unit_cost: Decimal::ZERO,
            notes: new_asset.notes,
            created_at: now,
            updated_at: now,
        };
        state.assets.insert(id, asset.clone());
        Ok(asset)
    }

    async fn update(&self, update: AssetUpdate) -> Result<Asset> {
        let mut state = self.state();
        let asset = state
            .assets
            .get_mut(&update.id)
            .ok_or_else(|| not_found("asset", &update.id))?;
        asset.name = update.name;
        asset.code = update.code;
        asset.kind = update.kind;
        asset.currency = update.currency;
        asset.auto_update = update.auto_update;
        asset.notes = update.notes;
        Ok(asset.clone())
    }

    async fn delete(&self, asset_id: &str) -> Result<usize> {
        let mut state = self.state();
        if state.assets.remove(asset_id).is_none() {
            return Err(not_found("asset", asset_id));
        }
        let before = state.snapshots.len();
        state.snapshots.retain(|(id, _), _| id != asset_id);
        Ok(before - state.snapshots.len())
    }

    fn get_by_id(&self, asset_id: &str) -> Result<Asset> {
        self.state()
            .assets
            .get(asset_id)
            .cloned()
            .ok_or_else(|| not_found("asset", asset_id))
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Asset>> {
        Ok(self
            .state()
            .assets
            .values()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn list_owner_ids(&self) -> Result<Vec<String>> {
        let mut owners: Vec<String> = self
            .state()
            .assets
            .values()
            .map(|a| a.owner_id.clone())
            .collect();
        owners.sort();
        owners.dedup();
        Ok(owners)
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for InMemoryStore {
    fn get_valuations_for_owner(&self, owner_id: &str) -> Result<Vec<SnapshotValuation>> {
        let state = self.state();
        let mut valuations: Vec<SnapshotValuation> = state
            .snapshots
            .values()
            .filter_map(|s| {
                let asset = state.assets.get(&s.asset_id)?;
                (asset.owner_id == owner_id).then(|| SnapshotValuation {
                    date: s.date,
                    asset_id: s.asset_id.clone(),
                    currency: asset.currency.clone(),
                    amount: s.amount,
                })
            })
            .collect();
        valuations.sort_by(|a, b| a.date.cmp(&b.date).then(a.asset_id.cmp(&b.asset_id)));
        Ok(valuations)
    }

    fn get_snapshots_for_date(&self, owner_id: &str, date: NaiveDate) -> Result<Vec<Snapshot>> {
        let state = self.state();
        Ok(state
            .snapshots
            .values()
            .filter(|s| s.date == date && state.owner_of(&s.asset_id) == Some(owner_id))
            .cloned()
            .collect())
    }

    fn get_latest_snapshots_before(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<HashMap<String, Snapshot>> {
        let state = self.state();
        let mut latest = HashMap::new();
        for s in state
            .snapshots
            .values()
            .filter(|s| s.date < date && state.owner_of(&s.asset_id) == Some(owner_id))
        {
            latest.insert(s.asset_id.clone(), s.clone());
        }
        Ok(latest)
    }

    fn get_latest_snapshots(&self, owner_id: &str) -> Result<HashMap<String, Snapshot>> {
        let state = self.state();
        let mut latest = HashMap::new();
        for s in state
            .snapshots
            .values()
            .filter(|s| state.owner_of(&s.asset_id) == Some(owner_id))
        {
            latest.insert(s.asset_id.clone(), s.clone());
        }
        Ok(latest)
    }

    fn get_snapshot(&self, asset_id: &str, date: NaiveDate) -> Result<Option<Snapshot>> {
        let state = self.state();
        if state.unreadable_snapshot_asset.as_deref() == Some(asset_id) {
            return Err(
                DatabaseError::QueryFailed(format!("snapshot of {} is unreadable", asset_id)).into(),
            );
        }
        Ok(state.snapshots.get(&(asset_id.to_string(), date)).cloned())
    }

    fn get_snapshot_dates(&self, owner_id: &str) -> Result<Vec<NaiveDate>> {
        let state = self.state();
        let mut dates: Vec<NaiveDate> = state
            .snapshots
            .values()
            .filter(|s| state.owner_of(&s.asset_id) == Some(owner_id))
            .map(|s| s.date)
            .collect();
        dates.sort_by(|a, b| b.cmp(a));
        dates.dedup();
        Ok(dates)
    }

    async fn save_balance_entries(
        &self,
        snapshots: Vec<Snapshot>,
        holdings: Vec<HoldingUpdate>,
    ) -> Result<usize> {
        let mut state = self.state();
        let count = snapshots.len();
        for s in snapshots {
            state.snapshots.insert((s.asset_id.clone(), s.date), s);
        }
        for h in &holdings {
            state.apply_holding(h);
        }
        Ok(count)
    }

    async fn upsert_snapshots(&self, snapshots: Vec<Snapshot>) -> Result<usize> {
        let mut state = self.state();
        let count = snapshots.len();
        for s in snapshots {
            state.snapshots.insert((s.asset_id.clone(), s.date), s);
        }
        Ok(count)
    }

    async fn delete_snapshots_for_date(&self, owner_id: &str, date: NaiveDate) -> Result<usize> {
        let mut state = self.state();
        let owned: Vec<String> = state
            .assets
            .values()
            .filter(|a| a.owner_id == owner_id)
            .map(|a| a.id.clone())
            .collect();
        let before = state.snapshots.len();
        state
            .snapshots
            .retain(|(asset_id, d), _| !(*d == date && owned.contains(asset_id)));
        Ok(before - state.snapshots.len())
    }
}

#[async_trait]
impl CashflowRepositoryTrait for InMemoryStore {
    async fn create(&self, new_event: NewCashflowEvent) -> Result<CashflowEvent> {
        let mut state = self.state();
        let id = match new_event.id {
            Some(id) => id,
            None => state.next_id("cf"),
        };
        let event = CashflowEvent {
            id: id.clone(),
            owner_id: new_event.owner_id,
            date: new_event.date,
            direction: new_event.direction,
            amount: new_event.amount,
            category: new_event.category,
            operator: new_event.operator,
            note: new_event.note,
            created_at: state.timestamp(),
        };
        state.cashflows.insert(id, event.clone());
        Ok(event)
    }

    async fn update(&self, update: CashflowUpdate) -> Result<CashflowEvent> {
        let mut state = self.state();
        let event = state
            .cashflows
            .get_mut(&update.id)
            .ok_or_else(|| not_found("cash flow", &update.id))?;
        event.date = update.date;
        event.direction = update.direction;
        event.amount = update.amount;
        event.category = update.category;
        event.operator = update.operator;
        event.note = update.note;
        Ok(event.clone())
    }

    async fn delete(&self, cashflow_id: &str) -> Result<usize> {
        Ok(self.state().cashflows.remove(cashflow_id).map_or(0, |_| 1))
    }

    fn get_by_id(&self, cashflow_id: &str) -> Result<CashflowEvent> {
        self.state()
            .cashflows
            .get(cashflow_id)
            .cloned()
            .ok_or_else(|| not_found("cash flow", cashflow_id))
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<CashflowEvent>> {
        let mut events: Vec<CashflowEvent> = self
            .state()
            .cashflows
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(events)
    }

    fn list_by_owner_and_date(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CashflowEvent>> {
        Ok(CashflowRepositoryTrait::list_by_owner(self, owner_id)?
            .into_iter()
            .filter(|e| e.date == date)
            .collect())
    }
}

#[async_trait]
impl FxRepositoryTrait for InMemoryStore {
    fn get_all_rates(&self) -> Result<Vec<ExchangeRate>> {
        Ok(self
            .state()
            .rates
            .iter()
            .map(|((date, currency), rate)| ExchangeRate {
                date: *date,
                currency: currency.clone(),
                rate: *rate,
            })
            .collect())
    }

    fn get_rates_for_currency(&self, currency: &str) -> Result<Vec<ExchangeRate>> {
        Ok(self
            .get_all_rates()?
            .into_iter()
            .filter(|r| r.currency == currency)
            .collect())
    }

    async fn upsert_rates(&self, rates: Vec<ExchangeRate>) -> Result<usize> {
        let mut state = self.state();
        let count = rates.len();
        for r in rates {
            state.rates.insert((r.date, r.currency), r.rate);
        }
        Ok(count)
    }

    async fn delete_rate(&self, date: NaiveDate, currency: &str) -> Result<usize> {
        Ok(self
            .state()
            .rates
            .remove(&(date, currency.to_string()))
            .map_or(0, |_| 1))
    }
}

#[async_trait]
impl FundHistoryRepositoryTrait for InMemoryStore {
    fn get_history(
        &self,
        owner_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<FundHistoryPoint>> {
        Ok(self
            .stored_history(owner_id)
            .into_iter()
            .filter(|p| start_date.map_or(true, |s| p.date >= s))
            .filter(|p| end_date.map_or(true, |e| p.date <= e))
            .collect())
    }

    async fn replace_history(
        &self,
        owner_id: &str,
        points: Vec<FundHistoryPoint>,
    ) -> Result<usize> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.replaces_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_replaces_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        // Yield so concurrent rebuilds of one owner would overlap here
        // if they were not serialized.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        let result = if self.fail_replace_history.load(Ordering::SeqCst) {
            Err(DatabaseError::TransactionFailed("disk full".to_string()).into())
        } else {
            let count = points.len();
            self.state().history.insert(owner_id.to_string(), points);
            Ok(count)
        };
        self.replaces_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl SettingsRepositoryTrait for InMemoryStore {
    fn get_settings(&self) -> Result<Settings> {
        let state = self.state();
        let mut settings = Settings::default();
        if let Some(code) = state.settings.get(setting_keys::BASE_CURRENCY) {
            settings.base_currency = code.clone();
        }
        if let Some(secs) = state
            .settings
            .get(setting_keys::QUOTE_TIMEOUT_SECS)
            .and_then(|v| v.parse().ok())
        {
            settings.quote_timeout_secs = secs;
        }
        Ok(settings)
    }

    async fn update_settings(&self, new_settings: &SettingsUpdate) -> Result<()> {
        let mut state = self.state();
        if let Some(code) = &new_settings.base_currency {
            state
                .settings
                .insert(setting_keys::BASE_CURRENCY.to_string(), code.clone());
        }
        if let Some(secs) = new_settings.quote_timeout_secs {
            state
                .settings
                .insert(setting_keys::QUOTE_TIMEOUT_SECS.to_string(), secs.to_string());
        }
        Ok(())
    }

    fn get_setting(&self, setting_key: &str) -> Result<String> {
        self.state()
            .settings
            .get(setting_key)
            .cloned()
            .ok_or_else(|| not_found("setting", setting_key))
    }

    async fn update_setting(&self, setting_key: &str, setting_value: &str) -> Result<()> {
        self.state()
            .settings
            .insert(setting_key.to_string(), setting_value.to_string());
        Ok(())
    }
}

#[async_trait]
impl PlanRepositoryTrait for InMemoryStore {
    async fn create(&self, new_plan: NewInvestmentPlan) -> Result<InvestmentPlan> {
        let mut state = self.state();
        let id = match new_plan.id {
            Some(id) => id,
            None => state.next_id("plan"),
        };
        let plan = InvestmentPlan {
            id: id.clone(),
            owner_id: new_plan.owner_id,
            asset_id: new_plan.asset_id,
            amount: new_plan.amount,
            frequency: new_plan.frequency,
            execution_day: new_plan.execution_day,
            source_asset_id: new_plan.source_asset_id,
            is_active: new_plan.is_active,
            created_at: state.timestamp(),
        };
        state.plans.insert(id, plan.clone());
        Ok(plan)
    }

    async fn update(&self, update: InvestmentPlanUpdate) -> Result<InvestmentPlan> {
        let mut state = self.state();
        let plan = state
            .plans
            .get_mut(&update.id)
            .ok_or_else(|| not_found("plan", &update.id))?;
        plan.amount = update.amount;
        plan.frequency = update.frequency;
        plan.execution_day = update.execution_day;
        plan.source_asset_id = update.source_asset_id;
        plan.is_active = update.is_active;
        Ok(plan.clone())
    }

    async fn delete(&self, plan_id: &str) -> Result<usize> {
        Ok(self.state().plans.remove(plan_id).map_or(0, |_| 1))
    }

    fn get_by_id(&self, plan_id: &str) -> Result<InvestmentPlan> {
        self.state()
            .plans
            .get(plan_id)
            .cloned()
            .ok_or_else(|| not_found("plan", plan_id))
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<InvestmentPlan>> {
        Ok(self
            .state()
            .plans
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn record_execution(&self, execution: PlanExecution) -> Result<()> {
        if self.fail_record_execution.load(Ordering::SeqCst) {
            return Err(DatabaseError::TransactionFailed("locked".to_string()).into());
        }
        CashflowRepositoryTrait::create(self, execution.cashflow.clone()).await?;
        let mut state = self.state();
        state.executions.push(execution.clone());
        state.apply_holding(&execution.target_holding);
        if let Some(holding) = &execution.source_holding {
            state.apply_holding(holding);
        }
        if let Some(s) = execution.source_snapshot.clone() {
            state.snapshots.insert((s.asset_id.clone(), s.date), s);
        }
        Ok(())
    }
}

/// Records every requested recompute and answers with a fixed outcome.
#[derive(Default)]
pub struct RecordingTrigger {
    calls: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl RecordingTrigger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl RecomputeTrigger for RecordingTrigger {
    async fn recompute(&self, owner_id: &str) -> RecomputeOutcome {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(owner_id.to_string());
        if self.fail.load(Ordering::SeqCst) {
            RecomputeOutcome::failed(owner_id, "storage unavailable")
        } else {
            RecomputeOutcome::completed(owner_id, 1, Vec::new())
        }
    }
}

/// Serves prices from a fixed table; codes missing from the table yield `None`.
#[derive(Default)]
pub struct StaticQuoteProvider {
    pub prices: HashMap<String, Decimal>,
    pub failing: Vec<String>,
    pub slow: Vec<String>,
}

impl StaticQuoteProvider {
    pub fn with_prices(prices: &[(&str, Decimal)]) -> Self {
        Self {
            prices: prices
                .iter()
                .map(|(code, price)| (code.to_string(), *price))
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl QuoteProviderTrait for StaticQuoteProvider {
    async fn get_unit_price(
        &self,
        code: &str,
        _kind: AssetKind,
        _date: NaiveDate,
    ) -> Result<Option<Decimal>> {
        if self.slow.iter().any(|c| c == code) {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        }
        if self.failing.iter().any(|c| c == code) {
            return Err(crate::quotes::QuoteError::Provider(format!("{} unavailable", code)).into());
        }
        Ok(self.prices.get(code).copied())
    }
}
