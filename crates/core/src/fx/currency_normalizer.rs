use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::currency::normalize_currency_code;
use super::rate_table::RateTable;
use crate::errors::Result;
use crate::snapshots::SnapshotValuation;
use crate::utils::decimal_utils::checked;

/// A snapshot amount expressed in the base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedValuation {
    pub date: NaiveDate,
    pub asset_id: String,
    pub currency: String,
    pub amount: Decimal,
    pub rate: Decimal,
    pub base_amount: Decimal,
    /// True when no rate was known and 1.0 was used instead.
    pub degraded: bool,
}

/// A (currency, day) for which no rate existed on or before that day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradedRate {
    pub currency: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizationResult {
    pub valuations: Vec<NormalizedValuation>,
    /// Sorted and de-duplicated.
    pub degraded: Vec<DegradedRate>,
}

/// Converts every valuation into the base currency of `rates`.
///
/// A missing rate never fails the conversion: the amount is taken at 1.0 and
/// the pair is reported in `degraded` so the caller can surface it.
pub fn normalize_valuations(
    valuations: &[SnapshotValuation],
    rates: &RateTable,
) -> Result<NormalizationResult> {
    let mut normalized = Vec::with_capacity(valuations.len());
    let mut degraded = BTreeSet::new();

    for valuation in valuations {
        let currency = normalize_currency_code(&valuation.currency);
        let (rate, is_degraded) = rates.rate_or_identity(&currency, valuation.date);
        if is_degraded {
            degraded.insert(DegradedRate {
                currency: currency.clone(),
                date: valuation.date,
            });
        }
        let base_amount = checked(
            valuation.amount.checked_mul(rate),
            "base-currency amount",
            valuation.date,
        )?;
        normalized.push(NormalizedValuation {
            date: valuation.date,
            asset_id: valuation.asset_id.clone(),
            currency,
            amount: valuation.amount,
            rate,
            base_amount,
            degraded: is_degraded,
        });
    }

    if !degraded.is_empty() {
        let currencies: BTreeSet<&str> = degraded.iter().map(|d| d.currency.as_str()).collect();
        warn!(
            "No exchange rate to {} for {:?} on {} day(s); amounts taken at 1.0",
            rates.base_currency(),
            currencies,
            degraded.len()
        );
    }

    Ok(NormalizationResult {
        valuations: normalized,
        degraded: degraded.into_iter().collect(),
    })
}
