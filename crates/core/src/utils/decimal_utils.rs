use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::{CalculatorError, Result};

/// Divides, returning zero when the denominator is zero or the quotient overflows.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// Divides only when the denominator is strictly positive, zero otherwise.
pub fn div_if_positive(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    safe_div(numerator, denominator)
}

/// Lifts a checked arithmetic result into a calculation error tagged with
/// what was being computed and for which day.
pub fn checked(value: Option<Decimal>, what: &str, date: NaiveDate) -> Result<Decimal> {
    value.ok_or_else(|| {
        CalculatorError::Overflow {
            what: what.to_string(),
            date,
        }
        .into()
    })
}
