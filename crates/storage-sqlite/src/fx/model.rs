//! Database model for exchange rates.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use navfolio_core::fx::ExchangeRate;

use crate::errors::StorageError;
use crate::utils::{date_from_db, date_to_db, decimal_from_db, decimal_to_db};

/// Units of base currency per unit of `currency`, keyed by (rate_date, currency).
#[derive(Queryable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::exchange_rates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateDB {
    pub rate_date: String,
    pub currency: String,
    pub rate: String,
}

impl TryFrom<ExchangeRateDB> for ExchangeRate {
    type Error = StorageError;

    fn try_from(db: ExchangeRateDB) -> Result<Self, Self::Error> {
        Ok(Self {
            date: date_from_db(&db.rate_date, "rate_date")?,
            rate: decimal_from_db(&db.rate, "rate")?,
            currency: db.currency,
        })
    }
}

impl From<ExchangeRate> for ExchangeRateDB {
    fn from(domain: ExchangeRate) -> Self {
        Self {
            rate_date: date_to_db(domain.date),
            rate: decimal_to_db(domain.rate),
            currency: domain.currency,
        }
    }
}
