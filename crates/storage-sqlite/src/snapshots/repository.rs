use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;

use navfolio_core::assets::HoldingUpdate;
use navfolio_core::snapshots::{Snapshot, SnapshotRepositoryTrait, SnapshotValuation};
use navfolio_core::Result;

use super::model::AssetSnapshotDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{asset_snapshots, assets};
use crate::utils::{chunk_rows_for_sqlite, date_from_db, date_to_db, decimal_from_db, decimal_to_db};

pub struct SnapshotRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn load_owner_snapshots(
        &self,
        owner: &str,
        before: Option<NaiveDate>,
    ) -> Result<Vec<AssetSnapshotDB>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = asset_snapshots::table
            .inner_join(assets::table)
            .filter(assets::owner_id.eq(owner))
            .select(AssetSnapshotDB::as_select())
            .order((asset_snapshots::snapshot_date.asc(), asset_snapshots::asset_id.asc()))
            .into_boxed();
        if let Some(day) = before {
            query = query.filter(asset_snapshots::snapshot_date.lt(date_to_db(day)));
        }

        query
            .load::<AssetSnapshotDB>(&mut conn)
            .into_core()
    }
}

pub(crate) fn write_snapshots(conn: &mut SqliteConnection, snapshots: &[Snapshot]) -> Result<usize> {
    let rows: Vec<AssetSnapshotDB> = snapshots.iter().map(AssetSnapshotDB::from).collect();
    let mut written = 0;
    for chunk in chunk_rows_for_sqlite(&rows, 10) {
        // REPLACE drops the old row on the (asset_id, snapshot_date) conflict.
        written += diesel::replace_into(asset_snapshots::table)
            .values(chunk)
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(written)
}

pub(crate) fn write_holding(conn: &mut SqliteConnection, holding: &HoldingUpdate) -> Result<()> {
    let updated = diesel::update(assets::table.find(&holding.asset_id))
        .set((
            assets::last_shares.eq(decimal_to_db(holding.last_shares)),
            assets::unit_cost.eq(decimal_to_db(holding.unit_cost)),
            assets::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)
        .map_err(StorageError::from)?;
    if updated == 0 {
        return Err(StorageError::from(diesel::result::Error::NotFound).into());
    }
    Ok(())
}

/// Keeps the last snapshot per asset of a date-ordered list.
fn latest_per_asset(rows: Vec<AssetSnapshotDB>) -> Result<HashMap<String, Snapshot>> {
    let mut latest = HashMap::new();
    for row in rows {
        latest.insert(row.asset_id.clone(), Snapshot::try_from(row)?);
    }
    Ok(latest)
}

#[async_trait]
impl SnapshotRepositoryTrait for SnapshotRepository {
    fn get_valuations_for_owner(&self, owner_id: &str) -> Result<Vec<SnapshotValuation>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = asset_snapshots::table
            .inner_join(assets::table)
            .filter(assets::owner_id.eq(owner_id))
            .select((
                asset_snapshots::snapshot_date,
                asset_snapshots::asset_id,
                assets::currency,
                asset_snapshots::amount,
            ))
            .order((asset_snapshots::snapshot_date.asc(), asset_snapshots::asset_id.asc()))
            .load::<(String, String, String, String)>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter()
            .map(|(day, asset_id, currency, amount)| -> Result<SnapshotValuation> {
                Ok(SnapshotValuation {
                    date: date_from_db(&day, "snapshot_date")?,
                    amount: decimal_from_db(&amount, "amount")?,
                    asset_id,
                    currency,
                })
            })
            .collect()
    }

    fn get_snapshots_for_date(&self, owner_id: &str, date: NaiveDate) -> Result<Vec<Snapshot>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = asset_snapshots::table
            .inner_join(assets::table)
            .filter(assets::owner_id.eq(owner_id))
            .filter(asset_snapshots::snapshot_date.eq(date_to_db(date)))
            .select(AssetSnapshotDB::as_select())
            .order(asset_snapshots::asset_id.asc())
            .load::<AssetSnapshotDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter()
            .map(|row| Snapshot::try_from(row).map_err(Into::into))
            .collect()
    }

    fn get_latest_snapshots_before(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<HashMap<String, Snapshot>> {
        latest_per_asset(self.load_owner_snapshots(owner_id, Some(date))?)
    }

    fn get_latest_snapshots(&self, owner_id: &str) -> Result<HashMap<String, Snapshot>> {
        latest_per_asset(self.load_owner_snapshots(owner_id, None)?)
    }

    fn get_snapshot(&self, asset_id: &str, date: NaiveDate) -> Result<Option<Snapshot>> {
        let mut conn = get_connection(&self.pool)?;

        let row = asset_snapshots::table
            .filter(asset_snapshots::asset_id.eq(asset_id))
            .filter(asset_snapshots::snapshot_date.eq(date_to_db(date)))
            .select(AssetSnapshotDB::as_select())
            .first::<AssetSnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        row.map(Snapshot::try_from).transpose().map_err(Into::into)
    }

    fn get_snapshot_dates(&self, owner_id: &str) -> Result<Vec<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;

        let days = asset_snapshots::table
            .inner_join(assets::table)
            .filter(assets::owner_id.eq(owner_id))
            .select(asset_snapshots::snapshot_date)
            .distinct()
            .order(asset_snapshots::snapshot_date.desc())
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;

        days.iter()
            .map(|d| date_from_db(d, "snapshot_date").map_err(Into::into))
            .collect()
    }

    async fn save_balance_entries(
        &self,
        snapshots: Vec<Snapshot>,
        holdings: Vec<HoldingUpdate>,
    ) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                let written = write_snapshots(conn, &snapshots)?;
                for holding in &holdings {
                    write_holding(conn, holding)?;
                }
                Ok(written)
            })
            .await
    }

    async fn upsert_snapshots(&self, snapshots: Vec<Snapshot>) -> Result<usize> {
        self.writer
            .exec(move |conn| write_snapshots(conn, &snapshots))
            .await
    }

    async fn delete_snapshots_for_date(&self, owner_id: &str, date: NaiveDate) -> Result<usize> {
        let owner = owner_id.to_string();
        let day = date_to_db(date);
        self.writer
            .exec(move |conn| {
                let owned_assets = assets::table
                    .filter(assets::owner_id.eq(owner))
                    .select(assets::id);

                diesel::delete(
                    asset_snapshots::table
                        .filter(asset_snapshots::snapshot_date.eq(day))
                        .filter(asset_snapshots::asset_id.eq_any(owned_assets)),
                )
                .execute(conn)
                .into_core()
            })
            .await
    }
}
