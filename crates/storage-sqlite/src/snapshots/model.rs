//! Database model for asset snapshots.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use navfolio_core::snapshots::Snapshot;

use crate::errors::StorageError;
use crate::utils::{date_from_db, date_to_db, decimal_from_db, decimal_to_db};

/// One asset on one day. Unique per (asset_id, snapshot_date).
#[derive(
    Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::asset_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct AssetSnapshotDB {
    pub id: String,
    pub asset_id: String,
    pub snapshot_date: String,
    pub amount: String,
    pub profit: String,
    pub cost: String,
    pub yield_rate: String,
    pub shares: String,
    pub unit_nav: String,
    pub is_cleared: bool,
}

impl TryFrom<AssetSnapshotDB> for Snapshot {
    type Error = StorageError;

    fn try_from(db: AssetSnapshotDB) -> Result<Self, Self::Error> {
        Ok(Self {
            date: date_from_db(&db.snapshot_date, "snapshot_date")?,
            amount: decimal_from_db(&db.amount, "amount")?,
            profit: decimal_from_db(&db.profit, "profit")?,
            cost: decimal_from_db(&db.cost, "cost")?,
            yield_rate: decimal_from_db(&db.yield_rate, "yield_rate")?,
            shares: decimal_from_db(&db.shares, "shares")?,
            unit_nav: decimal_from_db(&db.unit_nav, "unit_nav")?,
            id: db.id,
            asset_id: db.asset_id,
            is_cleared: db.is_cleared,
        })
    }
}

impl From<&Snapshot> for AssetSnapshotDB {
    fn from(domain: &Snapshot) -> Self {
        Self {
            id: Snapshot::make_id(&domain.asset_id, domain.date),
            asset_id: domain.asset_id.clone(),
            snapshot_date: date_to_db(domain.date),
            amount: decimal_to_db(domain.amount),
            profit: decimal_to_db(domain.profit),
            cost: decimal_to_db(domain.cost),
            yield_rate: decimal_to_db(domain.yield_rate),
            shares: decimal_to_db(domain.shares),
            unit_nav: decimal_to_db(domain.unit_nav),
            is_cleared: domain.is_cleared,
        }
    }
}
