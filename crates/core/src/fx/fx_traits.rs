use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::fx_model::{ExchangeRate, NewExchangeRate};
use super::rate_table::RateTable;
use crate::errors::Result;

/// Persistence for exchange rates, keyed by (date, currency).
#[async_trait]
pub trait FxRepositoryTrait: Send + Sync {
    /// All recorded rates ordered by date then currency.
    fn get_all_rates(&self) -> Result<Vec<ExchangeRate>>;

    fn get_rates_for_currency(&self, currency: &str) -> Result<Vec<ExchangeRate>>;

    /// Inserts or replaces the rate for each (date, currency).
    async fn upsert_rates(&self, rates: Vec<ExchangeRate>) -> Result<usize>;

    async fn delete_rate(&self, date: NaiveDate, currency: &str) -> Result<usize>;
}

#[async_trait]
pub trait FxServiceTrait: Send + Sync {
    fn get_exchange_rates(&self) -> Result<Vec<ExchangeRate>>;

    /// Rate table against `base_currency` built from every stored rate.
    fn build_rate_table(&self, base_currency: &str) -> Result<RateTable>;

    /// Latest known rate per currency, used for forward-looking estimates.
    fn get_latest_rates(&self, base_currency: &str) -> Result<BTreeMap<String, Decimal>>;

    async fn save_exchange_rate(&self, new_rate: NewExchangeRate) -> Result<ExchangeRate>;

    async fn save_exchange_rates(&self, new_rates: Vec<NewExchangeRate>) -> Result<usize>;

    async fn delete_exchange_rate(&self, date: NaiveDate, currency: &str) -> Result<()>;
}
