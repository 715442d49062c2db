//! Balance-method arithmetic.
//!
//! The owner enters what the account statement shows (amount, cumulative
//! profit, unit NAV) and the rest is derived. The inverse direction values a
//! known share count at a fresh unit price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::utils::decimal_utils::{div_if_positive, safe_div};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDerivation {
    pub cost: Decimal,
    /// Percent.
    pub yield_rate: Decimal,
    pub shares: Decimal,
    pub unit_cost: Decimal,
}

/// Derives cost, yield, shares and unit cost from an entered balance.
///
/// `yield_rate` is zero when cost is zero, `shares` is zero unless the unit
/// NAV is positive, and `unit_cost` is zero unless shares are positive.
pub fn derive_from_balance(amount: Decimal, profit: Decimal, unit_nav: Decimal) -> BalanceDerivation {
    let cost = amount - profit;
    let yield_rate = safe_div(profit, cost) * dec!(100);
    let shares = div_if_positive(amount, unit_nav);
    let unit_cost = div_if_positive(cost, shares);
    BalanceDerivation {
        cost,
        yield_rate,
        shares,
        unit_cost,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitValuation {
    pub amount: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub yield_rate: Decimal,
}

/// Values `shares` at `unit_nav`, with cost carried at `unit_cost` per share.
pub fn value_from_units(shares: Decimal, unit_nav: Decimal, unit_cost: Decimal) -> UnitValuation {
    let amount = shares * unit_nav;
    let cost = shares * unit_cost;
    let profit = amount - cost;
    UnitValuation {
        amount,
        cost,
        profit,
        yield_rate: safe_div(profit, cost) * dec!(100),
    }
}
