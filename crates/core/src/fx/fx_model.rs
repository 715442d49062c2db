use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::currency::{is_valid_currency_code, normalize_currency_code};
use super::FxError;
use crate::errors::Result;

/// Units of base currency per one unit of `currency`, effective from `date`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub date: NaiveDate,
    pub currency: String,
    pub rate: Decimal,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewExchangeRate {
    pub date: NaiveDate,
    pub currency: String,
    pub rate: Decimal,
}

impl NewExchangeRate {
    /// Validates the rate and returns it with a normalized currency code.
    pub fn into_validated(self) -> Result<ExchangeRate> {
        if !is_valid_currency_code(&self.currency) {
            return Err(FxError::InvalidCurrencyCode(self.currency).into());
        }
        if self.rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(format!(
                "rate for {} on {} must be positive, got {}",
                self.currency, self.date, self.rate
            ))
            .into());
        }
        Ok(ExchangeRate {
            date: self.date,
            currency: normalize_currency_code(&self.currency),
            rate: self.rate,
        })
    }
}
