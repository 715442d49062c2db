//! Classifies cash-flow events as external or internal to the fund.
//!
//! Only external flows (money crossing the fund boundary) create or destroy
//! shares. Internal flows move money between the owner's own assets and
//! leave the share count alone.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::cashflow_model::CashflowEvent;
use crate::errors::Result;
use crate::utils::decimal_utils::checked;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Subscription or redemption; changes the share count.
    External,
    /// Transfer between the owner's assets; does not change the share count.
    Internal,
}

pub fn classify_flow(event: &CashflowEvent) -> FlowType {
    if event.category.is_internal() {
        FlowType::Internal
    } else {
        FlowType::External
    }
}

pub fn is_external_flow(event: &CashflowEvent) -> bool {
    classify_flow(event) == FlowType::External
}

/// Sums the signed amounts of external flows per day.
///
/// Days whose external flows cancel out are kept with a zero entry.
pub fn net_external_flows_by_date(
    events: &[CashflowEvent],
) -> Result<BTreeMap<NaiveDate, Decimal>> {
    let mut net: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for event in events.iter().filter(|e| is_external_flow(e)) {
        let day_total = net.entry(event.date).or_insert(Decimal::ZERO);
        *day_total = checked(
            day_total.checked_add(event.signed_amount()),
            "net external flow",
            event.date,
        )?;
    }
    Ok(net)
}
