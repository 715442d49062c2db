//! The unit-NAV recurrence.
//!
//! Walks daily totals in date order and turns them into a fund series whose
//! unit price moves only with market return: external flows buy or redeem
//! shares at the day's unit NAV instead of moving the price.

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::fund_model::{DailyTotal, FundHistoryPoint};
use crate::constants::INITIAL_UNIT_NAV;
use crate::errors::Result;
use crate::utils::decimal_utils::{checked, div_if_positive, safe_div};

/// State carried from one day to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct NavState {
    pub prev_total_assets: Decimal,
    pub prev_unit_nav: Decimal,
    pub prev_shares: Decimal,
    pub max_nav_so_far: Decimal,
    pub principal: Decimal,
    started: bool,
}

impl Default for NavState {
    fn default() -> Self {
        Self {
            prev_total_assets: Decimal::ZERO,
            prev_unit_nav: INITIAL_UNIT_NAV,
            prev_shares: Decimal::ZERO,
            max_nav_so_far: INITIAL_UNIT_NAV,
            principal: Decimal::ZERO,
            started: false,
        }
    }
}

impl NavState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether at least one day has been processed.
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Advances the recurrence by one day.
    ///
    /// The first day bootstraps the fund at a unit NAV of 1.0 with one share
    /// per unit of currency, and its principal is the day's total regardless
    /// of any flows recorded on it.
    pub fn step(
        &mut self,
        owner_id: &str,
        day: &DailyTotal,
        net_flow: Decimal,
    ) -> Result<FundHistoryPoint> {
        let date = day.date;
        let total_assets = day.total_assets;

        self.principal = checked(self.principal.checked_add(net_flow), "principal", date)?;

        let (unit_nav, daily_return, shares) = if !self.started {
            self.principal = total_assets;
            (INITIAL_UNIT_NAV, Decimal::ZERO, total_assets)
        } else {
            let market_gain = checked(
                total_assets
                    .checked_sub(net_flow)
                    .and_then(|v| v.checked_sub(self.prev_total_assets)),
                "market gain",
                date,
            )?;
            let daily_return = safe_div(market_gain, self.prev_total_assets);
            let growth = checked(Decimal::ONE.checked_add(daily_return), "growth", date)?;
            let unit_nav = checked(self.prev_unit_nav.checked_mul(growth), "unit NAV", date)?;
            let shares_delta = div_if_positive(net_flow, unit_nav);
            let shares = checked(self.prev_shares.checked_add(shares_delta), "shares", date)?;
            (unit_nav, daily_return, shares)
        };

        let accumulated_profit = checked(
            total_assets.checked_sub(self.principal),
            "accumulated profit",
            date,
        )?;

        self.max_nav_so_far = self.max_nav_so_far.max(unit_nav);
        let drawdown = if self.max_nav_so_far <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            let below_peak = checked(
                unit_nav.checked_sub(self.max_nav_so_far),
                "drawdown",
                date,
            )?;
            safe_div(below_peak, self.max_nav_so_far)
        };

        self.prev_total_assets = total_assets;
        self.prev_unit_nav = unit_nav;
        self.prev_shares = shares;
        self.started = true;

        Ok(FundHistoryPoint {
            owner_id: owner_id.to_string(),
            date,
            unit_nav,
            total_shares: shares,
            total_assets,
            daily_return,
            drawdown,
            max_nav_so_far: self.max_nav_so_far,
            accumulated_profit,
            principal: self.principal,
        })
    }
}

/// Computes the full fund series of an owner from scratch.
///
/// `daily_totals` must be in ascending date order. `net_flows` holds the
/// signed external flow per day. Flows dated on a day
/// without a daily total are never applied.
pub fn compute_fund_history(
    owner_id: &str,
    daily_totals: &[DailyTotal],
    net_flows: &BTreeMap<NaiveDate, Decimal>,
) -> Result<Vec<FundHistoryPoint>> {
    let mut state = NavState::new();
    let mut points = Vec::with_capacity(daily_totals.len());

    for day in daily_totals {
        let net_flow = net_flows.get(&day.date).copied().unwrap_or(Decimal::ZERO);
        points.push(state.step(owner_id, day, net_flow)?);
    }

    let orphaned = net_flows
        .keys()
        .filter(|d| daily_totals.binary_search_by(|t| t.date.cmp(d)).is_err())
        .count();
    if orphaned > 0 {
        debug!(
            "{} external flow day(s) of {} fall on days without snapshots and were not applied",
            orphaned, owner_id
        );
    }

    Ok(points)
}
