//! Dashboard figures derived from a stored fund series.

use rust_decimal::Decimal;

use super::fund_model::{DrawdownWindow, FundHistoryPoint, FundSummary};
use crate::constants::{INITIAL_UNIT_NAV, MIN_SHARES_FOR_UNIT_COST, NEW_HIGH_TOLERANCE};
use crate::utils::decimal_utils::safe_div;

/// Principal per share; 1.0 while the fund holds (almost) no shares.
pub fn unit_holding_cost(point: &FundHistoryPoint) -> Decimal {
    if point.total_shares > MIN_SHARES_FOR_UNIT_COST {
        safe_div(point.principal, point.total_shares)
    } else {
        INITIAL_UNIT_NAV
    }
}

/// How far the unit NAV sits above the unit holding cost, as a fraction.
pub fn safety_margin(unit_nav: Decimal, unit_holding_cost: Decimal) -> Decimal {
    safe_div(unit_nav - unit_holding_cost, unit_holding_cost)
}

pub fn cumulative_return(points: &[FundHistoryPoint]) -> Decimal {
    points
        .last()
        .map_or(Decimal::ZERO, |p| p.unit_nav - INITIAL_UNIT_NAV)
}

/// Most negative stored drawdown; zero for an empty series.
pub fn max_drawdown(points: &[FundHistoryPoint]) -> Decimal {
    points
        .iter()
        .map(|p| p.drawdown)
        .min()
        .unwrap_or(Decimal::ZERO)
        .min(Decimal::ZERO)
}

pub fn period_return(points: &[FundHistoryPoint]) -> Decimal {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => safe_div(last.unit_nav - first.unit_nav, first.unit_nav),
        _ => Decimal::ZERO,
    }
}

/// Deepest peak-to-trough episode inside `points`, measured against a
/// running maximum that restarts at the first point of the slice.
///
/// Returns `None` when the slice never dips below its running maximum.
pub fn drawdown_window(points: &[FundHistoryPoint]) -> Option<DrawdownWindow> {
    let first = points.first()?;
    let mut rolling_max = first.unit_nav;
    let mut trough_idx = 0;
    let mut trough_peak = rolling_max;
    let mut deepest = Decimal::ZERO;

    for (idx, point) in points.iter().enumerate() {
        rolling_max = rolling_max.max(point.unit_nav);
        let dd = safe_div(point.unit_nav - rolling_max, rolling_max);
        if dd < deepest {
            deepest = dd;
            trough_idx = idx;
            trough_peak = rolling_max;
        }
    }

    if deepest >= Decimal::ZERO {
        return None;
    }

    let threshold = trough_peak * NEW_HIGH_TOLERANCE;
    let peak_date = points[..=trough_idx]
        .iter()
        .rev()
        .find(|p| p.unit_nav >= threshold)
        .map_or(first.date, |p| p.date);
    let recovery_date = points[trough_idx + 1..]
        .iter()
        .find(|p| p.unit_nav >= threshold)
        .map(|p| p.date);

    let slice_max = points
        .iter()
        .map(|p| p.unit_nav)
        .max()
        .unwrap_or(rolling_max);
    let at_new_high = points
        .last()
        .map_or(false, |p| p.unit_nav >= slice_max * NEW_HIGH_TOLERANCE);

    Some(DrawdownWindow {
        peak_date,
        trough_date: points[trough_idx].date,
        recovery_date,
        max_drawdown: deepest,
        at_new_high,
    })
}

/// Builds the dashboard summary.
///
/// `history` is the whole series (for cumulative figures); `window` is the
/// slice being viewed (for period return and the drawdown window).
pub fn summarize(
    owner_id: &str,
    history: &[FundHistoryPoint],
    window: &[FundHistoryPoint],
) -> Option<FundSummary> {
    let latest = window.last().or_else(|| history.last())?;
    let holding_cost = unit_holding_cost(latest);

    Some(FundSummary {
        owner_id: owner_id.to_string(),
        as_of: latest.date,
        total_assets: latest.total_assets,
        accumulated_profit: latest.accumulated_profit,
        principal: latest.principal,
        unit_nav: latest.unit_nav,
        total_shares: latest.total_shares,
        latest_daily_return: latest.daily_return,
        unit_holding_cost: holding_cost,
        safety_margin: safety_margin(latest.unit_nav, holding_cost),
        cumulative_return: cumulative_return(history),
        max_drawdown: max_drawdown(history),
        period_return: period_return(window),
        drawdown_window: drawdown_window(window),
    })
}
