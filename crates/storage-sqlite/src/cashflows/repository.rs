use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use navfolio_core::cashflows::{
    CashflowEvent, CashflowRepositoryTrait, CashflowUpdate, NewCashflowEvent,
};
use navfolio_core::Result;

use super::model::CashflowDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::cashflows;
use crate::utils::{date_to_db, decimal_to_db};

pub struct CashflowRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CashflowRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn to_domain(rows: Vec<CashflowDB>) -> Result<Vec<CashflowEvent>> {
    rows.into_iter()
        .map(|row| CashflowEvent::try_from(row).map_err(Into::into))
        .collect()
}

/// Inserts one event on the writer connection. Shared with plan execution,
/// which records its deduction in the same transaction as the holdings.
pub(crate) fn insert_cashflow(
    conn: &mut SqliteConnection,
    new_event: NewCashflowEvent,
) -> Result<CashflowEvent> {
    let row = CashflowDB {
        id: new_event
            .id
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        owner_id: new_event.owner_id,
        flow_date: date_to_db(new_event.date),
        direction: new_event.direction.as_db_str().to_string(),
        amount: decimal_to_db(new_event.amount),
        category: new_event.category.as_label().to_string(),
        operator: new_event.operator,
        note: new_event.note,
        created_at: Utc::now().naive_utc(),
    };

    let inserted = diesel::insert_into(cashflows::table)
        .values(&row)
        .returning(CashflowDB::as_returning())
        .get_result(conn)
        .map_err(StorageError::from)?;

    Ok(CashflowEvent::try_from(inserted)?)
}

#[async_trait]
impl CashflowRepositoryTrait for CashflowRepository {
    async fn create(&self, new_event: NewCashflowEvent) -> Result<CashflowEvent> {
        self.writer
            .exec(move |conn| insert_cashflow(conn, new_event))
            .await
    }

    async fn update(&self, update: CashflowUpdate) -> Result<CashflowEvent> {
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(cashflows::table.find(&update.id))
                    .set((
                        cashflows::flow_date.eq(date_to_db(update.date)),
                        cashflows::direction.eq(update.direction.as_db_str()),
                        cashflows::amount.eq(decimal_to_db(update.amount)),
                        cashflows::category.eq(update.category.as_label()),
                        cashflows::operator.eq(&update.operator),
                        cashflows::note.eq(&update.note),
                    ))
                    .returning(CashflowDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                Ok(CashflowEvent::try_from(updated)?)
            })
            .await
    }

    async fn delete(&self, cashflow_id: &str) -> Result<usize> {
        let id_owned = cashflow_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(cashflows::table.find(id_owned))
                    .execute(conn)
                    .into_core()
            })
            .await
    }

    fn get_by_id(&self, cashflow_id: &str) -> Result<CashflowEvent> {
        let mut conn = get_connection(&self.pool)?;

        let row = cashflows::table
            .find(cashflow_id)
            .select(CashflowDB::as_select())
            .first::<CashflowDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(CashflowEvent::try_from(row)?)
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<CashflowEvent>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = cashflows::table
            .filter(cashflows::owner_id.eq(owner_id))
            .order((cashflows::flow_date.asc(), cashflows::created_at.asc()))
            .select(CashflowDB::as_select())
            .load::<CashflowDB>(&mut conn)
            .map_err(StorageError::from)?;

        to_domain(rows)
    }

    fn list_by_owner_and_date(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CashflowEvent>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = cashflows::table
            .filter(cashflows::owner_id.eq(owner_id))
            .filter(cashflows::flow_date.eq(date_to_db(date)))
            .order(cashflows::created_at.asc())
            .select(CashflowDB::as_select())
            .load::<CashflowDB>(&mut conn)
            .map_err(StorageError::from)?;

        to_domain(rows)
    }
}
