use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::fund_model::DailyTotal;
use crate::errors::Result;
use crate::fx::NormalizedValuation;
use crate::utils::decimal_utils::checked;

/// Sums base-currency valuations into one total per day, in date order.
///
/// Only days with at least one valuation appear; gaps are left as gaps.
pub fn aggregate_daily_totals(valuations: &[NormalizedValuation]) -> Result<Vec<DailyTotal>> {
    let mut totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for valuation in valuations {
        let total = totals.entry(valuation.date).or_insert(Decimal::ZERO);
        *total = checked(
            total.checked_add(valuation.base_amount),
            "daily total",
            valuation.date,
        )?;
    }
    Ok(totals
        .into_iter()
        .map(|(date, total_assets)| DailyTotal { date, total_assets })
        .collect())
}
