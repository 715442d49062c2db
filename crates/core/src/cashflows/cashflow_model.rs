use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{Result, ValidationError};

/// Stored label of transfers from a cash asset into an auto-invest target.
/// Kept verbatim so existing datasets keep classifying correctly.
pub const AUTO_INVEST_DEDUCTION_LABEL: &str = "定投扣款";

/// Stored label of money moved between the owner's own assets.
pub const INTERNAL_REBALANCE_LABEL: &str = "内部调仓";

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowDirection {
    Income,
    Expense,
}

impl FlowDirection {
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            FlowDirection::Income => "INCOME",
            FlowDirection::Expense => "EXPENSE",
        }
    }

    /// Parses a stored direction, including the labels of older datasets.
    pub fn from_db_str(value: &str) -> Option<Self> {
        let value = value.trim();
        match value {
            "收入" => return Some(FlowDirection::Income),
            "支出" => return Some(FlowDirection::Expense),
            _ => {}
        }
        match value.to_ascii_uppercase().as_str() {
            "INCOME" | "IN" => Some(FlowDirection::Income),
            "EXPENSE" | "OUT" => Some(FlowDirection::Expense),
            _ => None,
        }
    }

    /// `+amount` for income, `-amount` for expense.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            FlowDirection::Income => amount,
            FlowDirection::Expense => -amount,
        }
    }
}

/// Free-text category of a cash-flow event, with two reserved values that
/// mark the event as internal to the fund.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum CashflowCategory {
    AutoInvestDeduction,
    InternalRebalance,
    External(String),
}

impl CashflowCategory {
    /// Maps a stored or user-entered label. Only an exact match of a reserved
    /// label is internal; everything else round-trips verbatim.
    pub fn from_label(label: &str) -> Self {
        match label {
            AUTO_INVEST_DEDUCTION_LABEL | "auto-invest deduction" => {
                CashflowCategory::AutoInvestDeduction
            }
            INTERNAL_REBALANCE_LABEL | "internal rebalance" => CashflowCategory::InternalRebalance,
            other => CashflowCategory::External(other.to_string()),
        }
    }

    /// Label written to storage.
    pub fn as_label(&self) -> &str {
        match self {
            CashflowCategory::AutoInvestDeduction => AUTO_INVEST_DEDUCTION_LABEL,
            CashflowCategory::InternalRebalance => INTERNAL_REBALANCE_LABEL,
            CashflowCategory::External(label) => label,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CashflowCategory::AutoInvestDeduction | CashflowCategory::InternalRebalance
        )
    }
}

impl fmt::Display for CashflowCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl From<String> for CashflowCategory {
    fn from(label: String) -> Self {
        CashflowCategory::from_label(&label)
    }
}

impl From<CashflowCategory> for String {
    fn from(category: CashflowCategory) -> Self {
        category.as_label().to_string()
    }
}

/// A dated movement of money recorded by an owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowEvent {
    pub id: String,
    pub owner_id: String,
    pub date: NaiveDate,
    pub direction: FlowDirection,
    /// Non-negative; the sign comes from `direction`.
    pub amount: Decimal,
    pub category: CashflowCategory,
    pub operator: Option<String>,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

impl CashflowEvent {
    pub fn signed_amount(&self) -> Decimal {
        self.direction.signed(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCashflowEvent {
    pub id: Option<String>,
    pub owner_id: String,
    pub date: NaiveDate,
    pub direction: FlowDirection,
    pub amount: Decimal,
    pub category: CashflowCategory,
    pub operator: Option<String>,
    pub note: Option<String>,
}

impl NewCashflowEvent {
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(ValidationError::MissingField("owner_id".to_string()).into());
        }
        validate_amount(self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowUpdate {
    pub id: String,
    pub date: NaiveDate,
    pub direction: FlowDirection,
    pub amount: Decimal,
    pub category: CashflowCategory,
    pub operator: Option<String>,
    pub note: Option<String>,
}

impl CashflowUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_amount(self.amount)
    }
}

/// External income and expense over a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::InvalidInput(format!(
            "cash-flow amount must not be negative, got {}",
            amount
        ))
        .into());
    }
    Ok(())
}
