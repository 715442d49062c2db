use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::plan_model::{
    ExecutedPlan, FailedPlan, InvestmentPlan, InvestmentPlanUpdate, NewInvestmentPlan,
    PlanExecution, PlanRunReport, PlannedOutflow,
};
use super::plan_traits::{PlanRepositoryTrait, PlanServiceTrait};
use crate::assets::{Asset, AssetRepositoryTrait, HoldingUpdate};
use crate::cashflows::{CashflowCategory, CashflowRepositoryTrait, FlowDirection, NewCashflowEvent};
use crate::constants::{DEFAULT_PROJECTION_DAYS, INITIAL_UNIT_NAV};
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink};
use crate::fund::RecomputeTrigger;
use crate::fx::FxServiceTrait;
use crate::quotes::{fetch_unit_price, QuoteProviderTrait};
use crate::settings::SettingsServiceTrait;
use crate::snapshots::Snapshot;
use crate::utils::decimal_utils::div_if_positive;
use crate::utils::time_utils::get_days_between;

const AUTO_INVEST_OPERATOR: &str = "auto-invest";

/// Text every auto-invest cash flow note starts with; a note containing it
/// marks the asset as already invested for that day.
pub fn auto_invest_marker(asset_name: &str) -> String {
    format!("auto-invest: {}", asset_name)
}

pub struct PlanService {
    plan_repository: Arc<dyn PlanRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    cashflow_repository: Arc<dyn CashflowRepositoryTrait>,
    quote_provider: Option<Arc<dyn QuoteProviderTrait>>,
    fx_service: Arc<dyn FxServiceTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
    recompute_trigger: Arc<dyn RecomputeTrigger>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl PlanService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        plan_repository: Arc<dyn PlanRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        cashflow_repository: Arc<dyn CashflowRepositoryTrait>,
        quote_provider: Option<Arc<dyn QuoteProviderTrait>>,
        fx_service: Arc<dyn FxServiceTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
        recompute_trigger: Arc<dyn RecomputeTrigger>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            plan_repository,
            asset_repository,
            cashflow_repository,
            quote_provider,
            fx_service,
            settings_service,
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

    fn ensure_owned(&self, owner_id: &str, asset_id: &str) -> Result<()> {
        let asset = self.asset_repository.get_by_id(asset_id)?;
        if asset.owner_id != owner_id {
            return Err(Error::Asset(format!(
                "asset {} does not belong to owner {}",
                asset_id, owner_id
            )));
        }
        Ok(())
    }

    /// Unit price for a purchase; 1.0 when the asset has no quote or the
    /// provider fails.
    async fn purchase_nav(&self, asset: &Asset, date: NaiveDate) -> Result<Decimal> {
        let (Some(provider), Some(code)) = (self.quote_provider.as_ref(), asset.code.as_deref())
        else {
            return Ok(INITIAL_UNIT_NAV);
        };
        if !asset.kind.is_quotable() {
            return Ok(INITIAL_UNIT_NAV);
        }
        let timeout = self.settings_service.get_quote_timeout()?;
        match fetch_unit_price(provider.as_ref(), code, asset.kind, date, timeout).await {
            Ok(Some(nav)) if nav > Decimal::ZERO => Ok(nav),
            Ok(_) => {
                warn!("No price for {} on {}; buying at 1.0", code, date);
                Ok(INITIAL_UNIT_NAV)
            }
            Err(e) => {
                warn!("Quote for {} failed ({}); buying at 1.0", code, e);
                Ok(INITIAL_UNIT_NAV)
            }
        }
    }

    fn build_execution(
        plan: &InvestmentPlan,
        date: NaiveDate,
        target: &Asset,
        source: Option<&Asset>,
        unit_nav: Decimal,
    ) -> (PlanExecution, ExecutedPlan) {
        let shares_added = div_if_positive(plan.amount, unit_nav);
        let new_shares = target.last_shares + shares_added;
        let new_unit_cost =
            div_if_positive(target.last_shares * target.unit_cost + plan.amount, new_shares);

        let (source_holding, source_snapshot) = match source {
            Some(cash) => {
                let remaining = cash.last_shares - plan.amount;
                let holding = HoldingUpdate {
                    asset_id: cash.id.clone(),
                    last_shares: remaining,
                    unit_cost: cash.unit_cost,
                };
                let snapshot = Snapshot {
                    id: Snapshot::make_id(&cash.id, date),
                    asset_id: cash.id.clone(),
                    date,
                    amount: remaining,
                    profit: Decimal::ZERO,
                    cost: remaining,
                    yield_rate: Decimal::ZERO,
                    shares: remaining,
                    unit_nav: Decimal::ONE,
                    is_cleared: false,
                };
                (Some(holding), Some(snapshot))
            }
            None => (None, None),
        };

        let note = format!(
            "{} (+{:.2} shares at {:.4}, unit cost {:.4})",
            auto_invest_marker(&target.name),
            shares_added,
            unit_nav,
            new_unit_cost
        );
        let execution = PlanExecution {
            plan_id: plan.id.clone(),
            date,
            target_holding: HoldingUpdate {
                asset_id: target.id.clone(),
                last_shares: new_shares,
                unit_cost: new_unit_cost,
            },
            source_holding,
            source_snapshot,
            cashflow: NewCashflowEvent {
                id: None,
                owner_id: plan.owner_id.clone(),
                date,
                direction: FlowDirection::Expense,
                amount: plan.amount,
                category: CashflowCategory::AutoInvestDeduction,
                operator: Some(AUTO_INVEST_OPERATOR.to_string()),
                note: Some(note),
            },
        };
        let executed = ExecutedPlan {
            plan_id: plan.id.clone(),
            asset_id: target.id.clone(),
            amount: plan.amount,
            unit_nav,
            shares_added,
        };
        (execution, executed)
    }
}

#[async_trait]
impl PlanServiceTrait for PlanService {
    fn get_plans(&self, owner_id: &str) -> Result<Vec<InvestmentPlan>> {
        self.plan_repository.list_by_owner(owner_id)
    }

    async fn create_plan(&self, new_plan: NewInvestmentPlan) -> Result<InvestmentPlan> {
        new_plan.validate()?;
        self.ensure_owned(&new_plan.owner_id, &new_plan.asset_id)?;
        if let Some(source_id) = &new_plan.source_asset_id {
            self.ensure_owned(&new_plan.owner_id, source_id)?;
        }
        self.plan_repository.create(new_plan).await
    }

    async fn update_plan(&self, update: InvestmentPlanUpdate) -> Result<InvestmentPlan> {
        update.validate()?;
        let existing = self.plan_repository.get_by_id(&update.id)?;
        if let Some(source_id) = &update.source_asset_id {
            self.ensure_owned(&existing.owner_id, source_id)?;
        }
        self.plan_repository.update(update).await
    }

    async fn delete_plan(&self, plan_id: &str) -> Result<()> {
        self.plan_repository.delete(plan_id).await?;
        Ok(())
    }

    async fn execute_due_plans(&self, owner_id: &str, date: NaiveDate) -> Result<PlanRunReport> {
        let mut report = PlanRunReport {
            date,
            executed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            recompute: None,
        };

        let due: Vec<InvestmentPlan> = self
            .plan_repository
            .list_by_owner(owner_id)?
            .into_iter()
            .filter(|p| p.is_active && p.is_due_on(date))
            .collect();
        if due.is_empty() {
            return Ok(report);
        }

        let mut assets = self.owned_assets(owner_id)?;
        let mut notes: Vec<String> = self
            .cashflow_repository
            .list_by_owner_and_date(owner_id, date)?
            .into_iter()
            .filter(|e| e.category == CashflowCategory::AutoInvestDeduction)
            .filter_map(|e| e.note)
            .collect();

        for plan in &due {
            let Some(target) = assets.get(&plan.asset_id).cloned() else {
                report.failed.push(FailedPlan {
                    plan_id: plan.id.clone(),
                    reason: format!("target asset {} not found", plan.asset_id),
                });
                continue;
            };

            let marker = auto_invest_marker(&target.name);
            if notes.iter().any(|note| note.contains(&marker)) {
                debug!("Plan {} already ran on {}; skipping", plan.id, date);
                report.skipped.push(plan.id.clone());
                continue;
            }

            let source = match &plan.source_asset_id {
                Some(source_id) => match assets.get(source_id) {
                    Some(cash) => Some(cash.clone()),
                    None => {
                        report.failed.push(FailedPlan {
                            plan_id: plan.id.clone(),
                            reason: format!("source asset {} not found", source_id),
                        });
                        continue;
                    }
                },
                None => None,
            };

            let unit_nav = self.purchase_nav(&target, date).await?;
            let (execution, executed) =
                Self::build_execution(plan, date, &target, source.as_ref(), unit_nav);
            let note = execution.cashflow.note.clone().unwrap_or_default();
            let target_holding = execution.target_holding.clone();
            let source_holding = execution.source_holding.clone();

            match self.plan_repository.record_execution(execution).await {
                Ok(()) => {
                    info!(
                        "Auto-invest {} into {} on {}: {} at {}",
                        plan.id, target.name, date, plan.amount, unit_nav
                    );
                    apply_holding(&mut assets, &target_holding);
                    if let Some(holding) = &source_holding {
                        apply_holding(&mut assets, holding);
                    }
                    notes.push(note);
                    report.executed.push(executed);
                }
                Err(e) => {
                    warn!("Auto-invest {} failed on {}: {}", plan.id, date, e);
                    report.failed.push(FailedPlan {
                        plan_id: plan.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if report.executed.is_empty() {
            return Ok(report);
        }

        self.event_sink.emit(DomainEvent::plans_executed(
            owner_id,
            report.executed.iter().map(|e| e.plan_id.clone()).collect(),
            date,
        ));
        let outcome = self
            .recompute_trigger
            .recompute(owner_id)
            .await
            .into_result()?;
        report.recompute = Some(outcome);
        Ok(report)
    }

    fn project_outflows(
        &self,
        owner_id: &str,
        start: NaiveDate,
        days: Option<u32>,
    ) -> Result<Vec<PlannedOutflow>> {
        let days = days.unwrap_or(DEFAULT_PROJECTION_DAYS);
        if days == 0 {
            return Ok(Vec::new());
        }
        let plans: Vec<InvestmentPlan> = self
            .plan_repository
            .list_by_owner(owner_id)?
            .into_iter()
            .filter(|p| p.is_active)
            .collect();
        if plans.is_empty() {
            return Ok(Vec::new());
        }

        let assets = self.owned_assets(owner_id)?;
        let base_currency = self.settings_service.get_base_currency()?;
        let latest_rates = self.fx_service.get_latest_rates(&base_currency)?;
        let end = start + Duration::days(i64::from(days) - 1);

        let mut outflows = Vec::new();
        for date in get_days_between(start, end) {
            for plan in plans.iter().filter(|p| p.is_due_on(date)) {
                let Some(asset) = assets.get(&plan.asset_id) else {
                    continue;
                };
                let rate = latest_rates
                    .get(&asset.currency)
                    .copied()
                    .unwrap_or(Decimal::ONE);
                outflows.push(PlannedOutflow {
                    date,
                    plan_id: plan.id.clone(),
                    asset_id: asset.id.clone(),
                    asset_name: asset.name.clone(),
                    amount: plan.amount,
                    currency: asset.currency.clone(),
                    base_amount: plan.amount * rate,
                });
            }
        }
        Ok(outflows)
    }
}

fn apply_holding(assets: &mut HashMap<String, Asset>, holding: &HoldingUpdate) {
    if let Some(asset) = assets.get_mut(&holding.asset_id) {
        asset.last_shares = holding.last_shares;
        asset.unit_cost = holding.unit_cost;
    }
}
