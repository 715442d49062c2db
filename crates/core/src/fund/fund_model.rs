//! Fund-series domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{CalculatorError, Result};
use crate::fx::DegradedRate;

/// Base-currency total of all of an owner's assets on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_assets: Decimal,
}

/// One day of an owner's derived fund series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundHistoryPoint {
    pub owner_id: String,
    pub date: NaiveDate,
    pub unit_nav: Decimal,
    pub total_shares: Decimal,
    pub total_assets: Decimal,
    pub daily_return: Decimal,
    /// `unit_nav / max_nav_so_far - 1`; never positive.
    pub drawdown: Decimal,
    pub max_nav_so_far: Decimal,
    pub accumulated_profit: Decimal,
    pub principal: Decimal,
}

/// Result of rebuilding an owner's fund series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeOutcome {
    pub owner_id: String,
    pub success: bool,
    pub row_count: usize,
    pub message: String,
    /// Currency/day pairs that were valued at 1.0 for lack of a rate.
    pub degraded_rates: Vec<DegradedRate>,
}

impl RecomputeOutcome {
    /// The owner has no snapshots; nothing was written.
    pub fn no_data(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            success: true,
            row_count: 0,
            message: "no data".to_string(),
            degraded_rates: Vec::new(),
        }
    }

    pub fn completed(owner_id: &str, row_count: usize, degraded_rates: Vec<DegradedRate>) -> Self {
        let message = if degraded_rates.is_empty() {
            format!("recomputed {} day(s)", row_count)
        } else {
            format!(
                "recomputed {} day(s); {} currency/day pair(s) valued at 1.0 for lack of a rate",
                row_count,
                degraded_rates.len()
            )
        };
        Self {
            owner_id: owner_id.to_string(),
            success: true,
            row_count,
            message,
            degraded_rates,
        }
    }

    pub fn failed(owner_id: &str, message: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            success: false,
            row_count: 0,
            message: message.into(),
            degraded_rates: Vec::new(),
        }
    }

    /// Turns a failed outcome into an error carrying its message verbatim.
    ///
    /// Used after a write has committed, so the caller learns that the data
    /// was saved but the fund series still reflects the previous state.
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            log::warn!(
                "Write committed but fund series of {} was not rebuilt: {}",
                self.owner_id, self.message
            );
            Err(CalculatorError::RecomputeFailed {
                owner_id: self.owner_id,
                message: self.message,
            }
            .into())
        }
    }
}

/// Peak-to-trough episode inside a viewing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownWindow {
    pub peak_date: NaiveDate,
    pub trough_date: NaiveDate,
    /// First day after the trough back at the peak, if any.
    pub recovery_date: Option<NaiveDate>,
    pub max_drawdown: Decimal,
    /// Whether the last point of the window is at (or within tolerance of) its peak.
    pub at_new_high: bool,
}

/// Dashboard figures for an owner over a viewing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundSummary {
    pub owner_id: String,
    pub as_of: NaiveDate,
    pub total_assets: Decimal,
    pub accumulated_profit: Decimal,
    pub principal: Decimal,
    pub unit_nav: Decimal,
    pub total_shares: Decimal,
    pub latest_daily_return: Decimal,
    /// Principal per share.
    pub unit_holding_cost: Decimal,
    /// `unit_nav / unit_holding_cost - 1`.
    pub safety_margin: Decimal,
    /// `unit_nav - 1` over the whole history.
    pub cumulative_return: Decimal,
    /// Most negative drawdown over the whole history.
    pub max_drawdown: Decimal,
    /// Last over first unit NAV inside the window, minus one.
    pub period_return: Decimal,
    pub drawdown_window: Option<DrawdownWindow>,
}
