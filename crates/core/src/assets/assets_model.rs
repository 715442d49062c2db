use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};
use crate::fx::{is_valid_currency_code, normalize_currency_code};

/// What an asset is. Drives quote lookups and entry-screen defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetKind {
    Fund,
    Stock,
    Cash,
    #[default]
    Other,
}

impl AssetKind {
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            AssetKind::Fund => "FUND",
            AssetKind::Stock => "STOCK",
            AssetKind::Cash => "CASH",
            AssetKind::Other => "OTHER",
        }
    }

    /// Parses a stored kind. Free-text labels from older datasets
    /// (e.g. "股票基金", "现金") are matched by keyword.
    pub fn from_db_str(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "FUND" => return AssetKind::Fund,
            "STOCK" => return AssetKind::Stock,
            "CASH" => return AssetKind::Cash,
            "OTHER" => return AssetKind::Other,
            _ => {}
        }
        if trimmed.contains("基金") {
            AssetKind::Fund
        } else if trimmed.contains("股票") {
            AssetKind::Stock
        } else if trimmed.contains("现金") {
            AssetKind::Cash
        } else {
            AssetKind::Other
        }
    }

    /// Whether a unit price can be fetched from a quote provider.
    pub const fn is_quotable(&self) -> bool {
        matches!(self, AssetKind::Fund | AssetKind::Stock)
    }
}

/// A holding owned by exactly one owner, valued in its own currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    /// Quote code, when the asset is quotable.
    pub code: Option<String>,
    pub kind: AssetKind,
    pub currency: String,
    /// Whether the daily quote refresh should price this asset.
    pub auto_update: bool,
    /// Shares as of the most recent write.
    pub last_shares: Decimal,
    /// Cost per share as of the most recent write.
    pub unit_cost: Decimal,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub id: Option<String>,
    pub owner_id: String,
    pub name: String,
    pub code: Option<String>,
    pub kind: AssetKind,
    pub currency: String,
    pub auto_update: bool,
    pub notes: Option<String>,
}

impl NewAsset {
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(ValidationError::MissingField("owner_id".to_string()).into());
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        validate_currency(&self.currency)
    }

    /// Trims text fields and upper-cases the currency.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.currency = normalize_currency_code(&self.currency);
        self.code = normalize_code(self.code);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUpdate {
    pub id: String,
    pub name: String,
    pub code: Option<String>,
    pub kind: AssetKind,
    pub currency: String,
    pub auto_update: bool,
    pub notes: Option<String>,
}

impl AssetUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        validate_currency(&self.currency)
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.currency = normalize_currency_code(&self.currency);
        self.code = normalize_code(self.code);
        self
    }
}

/// New share count and cost per share for an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingUpdate {
    pub asset_id: String,
    pub last_shares: Decimal,
    pub unit_cost: Decimal,
}

fn validate_currency(currency: &str) -> Result<()> {
    if !is_valid_currency_code(currency) {
        return Err(ValidationError::InvalidInput(format!(
            "'{}' is not a three-letter currency code",
            currency
        ))
        .into());
    }
    Ok(())
}

fn normalize_code(code: Option<String>) -> Option<String> {
    code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}
