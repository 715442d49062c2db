//! Compounding projection of a balance toward financial independence.
//!
//! Each year the balance grows by the expected return and then receives the
//! annual addition. The real balance divides out cumulative inflation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::planning_model::{FireAssumptions, FireProjection, FireProjectionRow};
use crate::constants::SAFE_WITHDRAWAL_RATE;
use crate::errors::{CalculatorError, Result};
use crate::utils::decimal_utils::div_if_positive;

fn step(value: Option<Decimal>, what: &str, year: i32) -> Result<Decimal> {
    value.ok_or_else(|| CalculatorError::ProjectionOverflow(format!("{} in {}", what, year)).into())
}

pub fn project_fire(base_amount: Decimal, assumptions: &FireAssumptions) -> Result<FireProjection> {
    assumptions.validate()?;

    let start = assumptions.start_year;
    let monthly_passive_income = step(
        base_amount.checked_mul(SAFE_WITHDRAWAL_RATE),
        "passive income",
        start,
    )? / dec!(12);
    let coverage_percent = div_if_positive(
        step(monthly_passive_income.checked_mul(dec!(100)), "coverage", start)?,
        assumptions.target_monthly_expense,
    );
    let annual_expense = step(
        assumptions.target_monthly_expense.checked_mul(dec!(12)),
        "annual expense",
        start,
    )?;
    let fire_number = step(
        annual_expense.checked_div(SAFE_WITHDRAWAL_RATE),
        "fire number",
        start,
    )?;

    let growth = Decimal::ONE + assumptions.annual_return_pct / dec!(100);
    let inflation = Decimal::ONE + assumptions.inflation_pct / dec!(100);

    let mut rows = Vec::with_capacity(assumptions.years as usize + 1);
    rows.push(FireProjectionRow {
        year: assumptions.start_year,
        age: assumptions.current_age,
        balance: base_amount,
        balance_real: base_amount,
        principal: base_amount,
    });

    let mut balance = base_amount;
    let mut principal = base_amount;
    let mut deflator = Decimal::ONE;
    for i in 1..=assumptions.years {
        let year = assumptions.start_year + i as i32;
        let grown = step(balance.checked_mul(growth), "balance", year)?;
        balance = step(grown.checked_add(assumptions.annual_addition), "balance", year)?;
        principal = step(principal.checked_add(assumptions.annual_addition), "principal", year)?;
        deflator = step(deflator.checked_mul(inflation), "inflation", year)?;

        rows.push(FireProjectionRow {
            year,
            age: assumptions.current_age + i,
            balance,
            balance_real: div_if_positive(balance, deflator),
            principal,
        });
    }

    Ok(FireProjection {
        base_amount,
        monthly_passive_income,
        coverage_percent,
        fire_number,
        rows,
    })
}
