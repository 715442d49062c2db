//! Database model for cash-flow events.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use navfolio_core::cashflows::{CashflowCategory, CashflowEvent, FlowDirection};

use crate::errors::StorageError;
use crate::utils::{date_from_db, decimal_from_db};

#[derive(
    Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::cashflows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct CashflowDB {
    pub id: String,
    pub owner_id: String,
    pub flow_date: String,
    /// `INCOME` or `EXPENSE`; older rows may carry free-text labels.
    pub direction: String,
    pub amount: String,
    pub category: String,
    pub operator: Option<String>,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<CashflowDB> for CashflowEvent {
    type Error = StorageError;

    fn try_from(db: CashflowDB) -> Result<Self, Self::Error> {
        let direction = FlowDirection::from_db_str(&db.direction).ok_or_else(|| {
            StorageError::Malformed(format!(
                "cash flow {} has unknown direction '{}'",
                db.id, db.direction
            ))
        })?;

        Ok(Self {
            date: date_from_db(&db.flow_date, "flow_date")?,
            amount: decimal_from_db(&db.amount, "amount")?,
            category: CashflowCategory::from_label(&db.category),
            id: db.id,
            owner_id: db.owner_id,
            direction,
            operator: db.operator,
            note: db.note,
            created_at: db.created_at,
        })
    }
}
