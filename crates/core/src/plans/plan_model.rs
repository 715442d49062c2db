use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assets::HoldingUpdate;
use crate::cashflows::NewCashflowEvent;
use crate::errors::{Result, ValidationError};
use crate::fund::RecomputeOutcome;
use crate::snapshots::Snapshot;
use crate::utils::time_utils::weekday_index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl PlanFrequency {
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            PlanFrequency::Daily => "DAILY",
            PlanFrequency::Weekly => "WEEKLY",
            PlanFrequency::Monthly => "MONTHLY",
        }
    }

    /// Parses a stored frequency, including the labels of older datasets.
    pub fn from_db_str(value: &str) -> Option<Self> {
        match value.trim() {
            "每天" | "每日" => Some(PlanFrequency::Daily),
            "每周" => Some(PlanFrequency::Weekly),
            "每月" => Some(PlanFrequency::Monthly),
            other => match other.to_ascii_uppercase().as_str() {
                "DAILY" => Some(PlanFrequency::Daily),
                "WEEKLY" => Some(PlanFrequency::Weekly),
                "MONTHLY" => Some(PlanFrequency::Monthly),
                _ => None,
            },
        }
    }
}

/// A recurring purchase of `amount` (in the target asset's currency).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentPlan {
    pub id: String,
    pub owner_id: String,
    pub asset_id: String,
    pub amount: Decimal,
    pub frequency: PlanFrequency,
    /// Weekday (Monday = 0) for weekly plans, day of month for monthly plans.
    pub execution_day: u32,
    /// Cash asset the money is taken from, if any.
    pub source_asset_id: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl InvestmentPlan {
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        match self.frequency {
            PlanFrequency::Daily => true,
            PlanFrequency::Weekly => weekday_index(date) == self.execution_day,
            PlanFrequency::Monthly => date.day() == self.execution_day,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvestmentPlan {
    pub id: Option<String>,
    pub owner_id: String,
    pub asset_id: String,
    pub amount: Decimal,
    pub frequency: PlanFrequency,
    pub execution_day: u32,
    pub source_asset_id: Option<String>,
    pub is_active: bool,
}

impl NewInvestmentPlan {
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(ValidationError::MissingField("owner_id".to_string()).into());
        }
        if self.asset_id.trim().is_empty() {
            return Err(ValidationError::MissingField("asset_id".to_string()).into());
        }
        validate_schedule(self.amount, self.frequency, self.execution_day)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentPlanUpdate {
    pub id: String,
    pub amount: Decimal,
    pub frequency: PlanFrequency,
    pub execution_day: u32,
    pub source_asset_id: Option<String>,
    pub is_active: bool,
}

impl InvestmentPlanUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_schedule(self.amount, self.frequency, self.execution_day)
    }
}

/// Weekly plans run on weekday 0..=6; monthly plans on day 1..=28 so that
/// they fire in every month.
fn validate_schedule(amount: Decimal, frequency: PlanFrequency, execution_day: u32) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::InvalidInput(format!(
            "plan amount must be positive, got {}",
            amount
        ))
        .into());
    }
    let valid_day = match frequency {
        PlanFrequency::Daily => true,
        PlanFrequency::Weekly => execution_day <= 6,
        PlanFrequency::Monthly => (1..=28).contains(&execution_day),
    };
    if !valid_day {
        return Err(ValidationError::InvalidInput(format!(
            "execution day {} is not valid for a {} plan",
            execution_day,
            frequency.as_db_str().to_lowercase()
        ))
        .into());
    }
    Ok(())
}

/// Every write of one plan execution, committed together.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanExecution {
    pub plan_id: String,
    pub date: NaiveDate,
    pub target_holding: HoldingUpdate,
    pub source_holding: Option<HoldingUpdate>,
    pub source_snapshot: Option<Snapshot>,
    pub cashflow: NewCashflowEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedPlan {
    pub plan_id: String,
    pub asset_id: String,
    pub amount: Decimal,
    pub unit_nav: Decimal,
    pub shares_added: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedPlan {
    pub plan_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRunReport {
    pub date: NaiveDate,
    pub executed: Vec<ExecutedPlan>,
    /// Plans that had already run for the day.
    pub skipped: Vec<String>,
    pub failed: Vec<FailedPlan>,
    pub recompute: Option<RecomputeOutcome>,
}

/// One upcoming plan occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedOutflow {
    pub date: NaiveDate,
    pub plan_id: String,
    pub asset_id: String,
    pub asset_name: String,
    pub amount: Decimal,
    pub currency: String,
    /// `amount` at the currency's latest known rate.
    pub base_amount: Decimal,
}
