//! Database model for fund history rows.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use navfolio_core::fund::FundHistoryPoint;

use crate::errors::StorageError;
use crate::utils::{date_from_db, date_to_db, decimal_from_db, decimal_to_db};

/// One derived row per (owner_id, history_date). Rebuilt wholesale on recompute.
#[derive(Queryable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::fund_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct FundHistoryDB {
    pub owner_id: String,
    pub history_date: String,
    pub unit_nav: String,
    pub total_shares: String,
    pub total_assets: String,
    pub daily_return: String,
    pub drawdown: String,
    pub max_nav_so_far: String,
    pub accumulated_profit: String,
    pub principal: String,
}

impl TryFrom<FundHistoryDB> for FundHistoryPoint {
    type Error = StorageError;

    fn try_from(db: FundHistoryDB) -> Result<Self, Self::Error> {
        Ok(Self {
            date: date_from_db(&db.history_date, "history_date")?,
            unit_nav: decimal_from_db(&db.unit_nav, "unit_nav")?,
            total_shares: decimal_from_db(&db.total_shares, "total_shares")?,
            total_assets: decimal_from_db(&db.total_assets, "total_assets")?,
            daily_return: decimal_from_db(&db.daily_return, "daily_return")?,
            drawdown: decimal_from_db(&db.drawdown, "drawdown")?,
            max_nav_so_far: decimal_from_db(&db.max_nav_so_far, "max_nav_so_far")?,
            accumulated_profit: decimal_from_db(&db.accumulated_profit, "accumulated_profit")?,
            principal: decimal_from_db(&db.principal, "principal")?,
            owner_id: db.owner_id,
        })
    }
}

impl From<FundHistoryPoint> for FundHistoryDB {
    fn from(domain: FundHistoryPoint) -> Self {
        Self {
            history_date: date_to_db(domain.date),
            unit_nav: decimal_to_db(domain.unit_nav),
            total_shares: decimal_to_db(domain.total_shares),
            total_assets: decimal_to_db(domain.total_assets),
            daily_return: decimal_to_db(domain.daily_return),
            drawdown: decimal_to_db(domain.drawdown),
            max_nav_so_far: decimal_to_db(domain.max_nav_so_far),
            accumulated_profit: decimal_to_db(domain.accumulated_profit),
            principal: decimal_to_db(domain.principal),
            owner_id: domain.owner_id,
        }
    }
}
