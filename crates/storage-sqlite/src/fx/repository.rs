use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use std::sync::Arc;

use navfolio_core::fx::{ExchangeRate, FxRepositoryTrait};
use navfolio_core::Result;

use super::model::ExchangeRateDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::exchange_rates;
use crate::utils::{chunk_rows_for_sqlite, date_to_db};

#[derive(Clone)]
pub struct FxRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl FxRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl FxRepositoryTrait for FxRepository {
    fn get_all_rates(&self) -> Result<Vec<ExchangeRate>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = exchange_rates::table
            .order((exchange_rates::rate_date.asc(), exchange_rates::currency.asc()))
            .select(ExchangeRateDB::as_select())
            .load::<ExchangeRateDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter()
            .map(|row| ExchangeRate::try_from(row).map_err(Into::into))
            .collect()
    }

    fn get_rates_for_currency(&self, currency: &str) -> Result<Vec<ExchangeRate>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = exchange_rates::table
            .filter(exchange_rates::currency.eq(currency))
            .order(exchange_rates::rate_date.asc())
            .select(ExchangeRateDB::as_select())
            .load::<ExchangeRateDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter()
            .map(|row| ExchangeRate::try_from(row).map_err(Into::into))
            .collect()
    }

    async fn upsert_rates(&self, rates: Vec<ExchangeRate>) -> Result<usize> {
        let rows: Vec<ExchangeRateDB> = rates.into_iter().map(ExchangeRateDB::from).collect();
        self.writer
            .exec(move |conn| {
                let mut written = 0;
                for chunk in chunk_rows_for_sqlite(&rows, 3) {
                    written += diesel::replace_into(exchange_rates::table)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(written)
            })
            .await
    }

    async fn delete_rate(&self, date: NaiveDate, currency: &str) -> Result<usize> {
        let day = date_to_db(date);
        let code = currency.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(exchange_rates::table.find((day, code)))
                    .execute(conn)
                    .into_core()
            })
            .await
    }
}
