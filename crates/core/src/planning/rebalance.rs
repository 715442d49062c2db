//! Drift between actual and target allocation, expressed as trades.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::planning_model::{GroupHolding, RebalanceAdvice, RebalanceLine, RebalanceTarget};
use crate::constants::REBALANCE_TARGET_TOLERANCE;
use crate::errors::{CalculatorError, Result, ValidationError};
use crate::utils::decimal_utils::div_if_positive;

fn sum(mut values: impl Iterator<Item = Decimal>, what: &str) -> Result<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v)
            .ok_or_else(|| CalculatorError::ProjectionOverflow(what.to_string()).into())
    })
}

fn validate_targets(targets: &[RebalanceTarget]) -> Result<()> {
    if let Some(bad) = targets
        .iter()
        .find(|t| t.target_percent < Decimal::ZERO || t.target_percent > dec!(100))
    {
        return Err(ValidationError::InvalidInput(format!(
            "target for {} must be between 0 and 100, got {}",
            bad.group, bad.target_percent
        ))
        .into());
    }
    let total = sum(targets.iter().map(|t| t.target_percent), "target total")?;
    if (total - dec!(100)).abs() > REBALANCE_TARGET_TOLERANCE {
        return Err(ValidationError::InvalidInput(format!(
            "target percentages must add up to 100, got {}",
            total
        ))
        .into());
    }
    Ok(())
}

/// Compares held amounts against target percentages of their total.
///
/// Groups held without a target are targeted at 0. Differences within
/// `min_trade` of zero are listed in `lines` but not advised as trades.
pub fn compute_rebalance(
    holdings: &[GroupHolding],
    targets: &[RebalanceTarget],
    min_trade: Decimal,
) -> Result<RebalanceAdvice> {
    validate_targets(targets)?;

    let mut groups: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    for holding in holdings {
        let entry = groups.entry(holding.group.as_str()).or_default();
        entry.0 = entry
            .0
            .checked_add(holding.amount)
            .ok_or_else(|| CalculatorError::ProjectionOverflow(format!("{} holdings", holding.group)))?;
    }
    for target in targets {
        groups.entry(target.group.as_str()).or_default().1 = target.target_percent;
    }

    let total = sum(holdings.iter().map(|h| h.amount), "portfolio total")?;

    let mut lines = Vec::with_capacity(groups.len());
    for (group, (amount, target_percent)) in groups {
        let target_amount = total
            .checked_mul(target_percent)
            .map(|v| v / dec!(100))
            .ok_or_else(|| CalculatorError::ProjectionOverflow(format!("{} target", group)))?;
        let overflow = || CalculatorError::ProjectionOverflow(format!("{} drift", group));
        let scaled = amount.checked_mul(dec!(100)).ok_or_else(overflow)?;
        let difference = target_amount.checked_sub(amount).ok_or_else(overflow)?;
        lines.push(RebalanceLine {
            group: group.to_string(),
            amount,
            actual_percent: div_if_positive(scaled, total),
            target_percent,
            target_amount,
            difference,
        });
    }

    let mut buys: Vec<RebalanceLine> = lines
        .iter()
        .filter(|l| l.difference > min_trade)
        .cloned()
        .collect();
    buys.sort_by(|a, b| b.difference.cmp(&a.difference));

    let mut sells: Vec<RebalanceLine> = lines
        .iter()
        .filter(|l| l.difference < -min_trade)
        .cloned()
        .collect();
    sells.sort_by(|a, b| a.difference.cmp(&b.difference));

    Ok(RebalanceAdvice {
        total,
        lines,
        buys,
        sells,
    })
}
