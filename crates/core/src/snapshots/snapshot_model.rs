use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::balance_method::{derive_from_balance, BalanceDerivation};
use crate::assets::AssetKind;
use crate::errors::{Result, ValidationError};
use crate::fund::RecomputeOutcome;

/// State of one asset on one day, in the asset's own currency.
///
/// At most one snapshot exists per (asset, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub asset_id: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub profit: Decimal,
    pub cost: Decimal,
    /// Profit over cost, in percent.
    pub yield_rate: Decimal,
    pub shares: Decimal,
    pub unit_nav: Decimal,
    /// The position was closed out; hidden from entry screens by default.
    pub is_cleared: bool,
}

impl Snapshot {
    pub fn make_id(asset_id: &str, date: NaiveDate) -> String {
        format!("{}_{}", asset_id, date.format("%Y-%m-%d"))
    }

    /// Builds a snapshot from a balance-method entry.
    pub fn from_balance_entry(entry: &BalanceEntry, date: NaiveDate) -> Self {
        let derived = derive_from_balance(entry.amount, entry.profit, entry.unit_nav);
        Self {
            id: Self::make_id(&entry.asset_id, date),
            asset_id: entry.asset_id.clone(),
            date,
            amount: entry.amount,
            profit: entry.profit,
            cost: derived.cost,
            yield_rate: derived.yield_rate,
            shares: derived.shares,
            unit_nav: entry.unit_nav,
            is_cleared: entry.is_cleared,
        }
    }
}

/// Snapshot amount joined with the currency of its asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotValuation {
    pub date: NaiveDate,
    pub asset_id: String,
    pub currency: String,
    pub amount: Decimal,
}

/// What the owner types in for one asset on the entry screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub asset_id: String,
    pub amount: Decimal,
    pub profit: Decimal,
    pub unit_nav: Decimal,
    #[serde(default)]
    pub is_cleared: bool,
}

impl BalanceEntry {
    pub fn validate(&self) -> Result<()> {
        if self.asset_id.trim().is_empty() {
            return Err(ValidationError::MissingField("asset_id".to_string()).into());
        }
        if self.unit_nav.is_sign_negative() && !self.unit_nav.is_zero() {
            return Err(ValidationError::InvalidInput(format!(
                "unit NAV of asset {} must not be negative",
                self.asset_id
            ))
            .into());
        }
        Ok(())
    }
}

/// Pre-filled entry-screen row for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRow {
    pub asset_id: String,
    pub name: String,
    pub code: Option<String>,
    pub kind: AssetKind,
    pub currency: String,
    pub amount: Decimal,
    pub profit: Decimal,
    pub unit_nav: Decimal,
    pub is_cleared: bool,
    /// A snapshot already exists for the requested day.
    pub has_snapshot: bool,
    /// Shares, cost and yield the prefilled values would produce.
    pub preview: BalanceDerivation,
}

/// A committed batch of snapshots and the rebuild that followed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshotsResult {
    pub saved: usize,
    pub recompute: RecomputeOutcome,
}
