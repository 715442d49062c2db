//! Database model for auto-invest plans.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use navfolio_core::plans::{InvestmentPlan, PlanFrequency};

use crate::errors::StorageError;
use crate::utils::decimal_from_db;

#[derive(
    Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::investment_plans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct InvestmentPlanDB {
    pub id: String,
    pub owner_id: String,
    pub asset_id: String,
    pub amount: String,
    pub frequency: String,
    pub execution_day: i32,
    pub source_asset_id: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl TryFrom<InvestmentPlanDB> for InvestmentPlan {
    type Error = StorageError;

    fn try_from(db: InvestmentPlanDB) -> Result<Self, Self::Error> {
        let frequency = PlanFrequency::from_db_str(&db.frequency).ok_or_else(|| {
            StorageError::Malformed(format!(
                "plan {} has unknown frequency '{}'",
                db.id, db.frequency
            ))
        })?;
        let execution_day = u32::try_from(db.execution_day).map_err(|_| {
            StorageError::Malformed(format!(
                "plan {} has negative execution day {}",
                db.id, db.execution_day
            ))
        })?;

        Ok(Self {
            amount: decimal_from_db(&db.amount, "amount")?,
            id: db.id,
            owner_id: db.owner_id,
            asset_id: db.asset_id,
            frequency,
            execution_day,
            source_asset_id: db.source_asset_id,
            is_active: db.is_active,
            created_at: db.created_at,
        })
    }
}
