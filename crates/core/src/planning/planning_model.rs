use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::DEFAULT_FIRE_PROJECTION_YEARS;
use crate::errors::{Result, ValidationError};

/// Inputs of a FIRE projection. Rates are percentages (8 means 8%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireAssumptions {
    /// Starting balance; the latest base-currency total is used when absent.
    pub base_amount: Option<Decimal>,
    /// Contribution added at the end of every year.
    pub annual_addition: Decimal,
    pub current_age: u32,
    pub start_year: i32,
    pub annual_return_pct: Decimal,
    pub inflation_pct: Decimal,
    pub target_monthly_expense: Decimal,
    pub years: u32,
}

impl Default for FireAssumptions {
    fn default() -> Self {
        Self {
            base_amount: None,
            annual_addition: dec!(200000),
            current_age: 28,
            start_year: Utc::now().year(),
            annual_return_pct: dec!(8),
            inflation_pct: dec!(3),
            target_monthly_expense: dec!(10000),
            years: DEFAULT_FIRE_PROJECTION_YEARS,
        }
    }
}

impl FireAssumptions {
    pub fn validate(&self) -> Result<()> {
        if self.annual_return_pct <= dec!(-100) || self.inflation_pct <= dec!(-100) {
            return Err(ValidationError::InvalidInput(
                "return and inflation rates must be above -100%".to_string(),
            )
            .into());
        }
        if self.target_monthly_expense.is_sign_negative() || self.annual_addition.is_sign_negative() {
            return Err(ValidationError::InvalidInput(
                "expense and annual addition must not be negative".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

/// One projected year. `balance_real` is the balance in today's money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireProjectionRow {
    pub year: i32,
    pub age: u32,
    pub balance: Decimal,
    pub balance_real: Decimal,
    pub principal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireProjection {
    pub base_amount: Decimal,
    /// Monthly income the base amount supports under the safe withdrawal rate.
    pub monthly_passive_income: Decimal,
    /// Passive income as a percentage of the target monthly expense.
    pub coverage_percent: Decimal,
    /// Balance whose safe withdrawal covers the target expense.
    pub fire_number: Decimal,
    /// Year 0 is the starting point.
    pub rows: Vec<FireProjectionRow>,
}

/// How assets are bucketed before comparing against targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "groups")]
pub enum RebalanceGrouping {
    /// One group per asset kind, named by its stored label.
    AssetKind,
    /// Caller-provided asset id to group name mapping. Unmapped assets are left out.
    Custom(HashMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceTarget {
    pub group: String,
    pub target_percent: Decimal,
}

/// Base-currency amount currently held in one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupHolding {
    pub group: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceLine {
    pub group: String,
    pub amount: Decimal,
    pub actual_percent: Decimal,
    pub target_percent: Decimal,
    pub target_amount: Decimal,
    /// Positive means buy, negative means sell.
    pub difference: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceAdvice {
    pub total: Decimal,
    /// Every targeted or held group, by name.
    pub lines: Vec<RebalanceLine>,
    /// Largest shortfall first.
    pub buys: Vec<RebalanceLine>,
    /// Largest excess first.
    pub sells: Vec<RebalanceLine>,
}

/// Base-currency holdings of an owner on their most recent snapshot day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestHoldings {
    pub date: Option<NaiveDate>,
    pub total: Decimal,
    /// Asset id to base-currency amount.
    pub by_asset: HashMap<String, Decimal>,
}
