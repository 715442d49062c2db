use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use navfolio_core::errors::ValidationError;
use navfolio_core::fund::{FundHistoryPoint, FundHistoryRepositoryTrait};
use navfolio_core::Result;

use super::model::FundHistoryDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::fund_history;
use crate::utils::{chunk_rows_for_sqlite, date_to_db};

pub struct FundHistoryRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl FundHistoryRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl FundHistoryRepositoryTrait for FundHistoryRepository {
    fn get_history(
        &self,
        owner_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<FundHistoryPoint>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = fund_history::table
            .filter(fund_history::owner_id.eq(owner_id))
            .select(FundHistoryDB::as_select())
            .order(fund_history::history_date.asc())
            .into_boxed();
        if let Some(start) = start_date {
            query = query.filter(fund_history::history_date.ge(date_to_db(start)));
        }
        if let Some(end) = end_date {
            query = query.filter(fund_history::history_date.le(date_to_db(end)));
        }

        let rows = query
            .load::<FundHistoryDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter()
            .map(|row| FundHistoryPoint::try_from(row).map_err(Into::into))
            .collect()
    }

    async fn replace_history(
        &self,
        owner_id: &str,
        points: Vec<FundHistoryPoint>,
    ) -> Result<usize> {
        if let Some(foreign) = points.iter().find(|p| p.owner_id != owner_id) {
            return Err(ValidationError::InvalidInput(format!(
                "fund row for owner {} cannot replace history of {}",
                foreign.owner_id, owner_id
            ))
            .into());
        }

        let owner = owner_id.to_string();
        let rows: Vec<FundHistoryDB> = points.into_iter().map(FundHistoryDB::from).collect();
        self.writer
            .exec(move |conn| {
                let removed = diesel::delete(
                    fund_history::table.filter(fund_history::owner_id.eq(&owner)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;

                let mut inserted = 0;
                for chunk in chunk_rows_for_sqlite(&rows, 10) {
                    inserted += diesel::insert_into(fund_history::table)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                debug!(
                    "Replaced fund history of {}: {} rows removed, {} inserted",
                    owner, removed, inserted
                );
                Ok(inserted)
            })
            .await
    }
}
