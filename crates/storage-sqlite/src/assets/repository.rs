use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use navfolio_core::assets::{Asset, AssetRepositoryTrait, AssetUpdate, NewAsset};
use navfolio_core::Result;

use super::model::{AssetDB, NewAssetDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{asset_snapshots, assets};
use crate::utils::decimal_to_db;

/// Repository for managing asset data in the database
pub struct AssetRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AssetRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl AssetRepositoryTrait for AssetRepository {
    async fn create(&self, new_asset: NewAsset) -> Result<Asset> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();
                let row = NewAssetDB {
                    id: new_asset
                        .id
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    owner_id: new_asset.owner_id,
                    name: new_asset.name,
                    code: new_asset.code,
                    kind: new_asset.kind.as_db_str().to_string(),
                    currency: new_asset.currency,
                    auto_update: new_asset.auto_update,
                    last_shares: decimal_to_db(Decimal::ZERO),
                    unit_cost: decimal_to_db(Decimal::ZERO),
                    notes: new_asset.notes,
                    created_at: now,
                    updated_at: now,
                };

                let inserted = diesel::insert_into(assets::table)
                    .values(&row)
                    .returning(AssetDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                Ok(Asset::try_from(inserted)?)
            })
            .await
    }

    async fn update(&self, update: AssetUpdate) -> Result<Asset> {
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(assets::table.find(&update.id))
                    .set((
                        assets::name.eq(&update.name),
                        assets::code.eq(&update.code),
                        assets::kind.eq(update.kind.as_db_str()),
                        assets::currency.eq(&update.currency),
                        assets::auto_update.eq(update.auto_update),
                        assets::notes.eq(&update.notes),
                        assets::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .returning(AssetDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                Ok(Asset::try_from(updated)?)
            })
            .await
    }

    async fn delete(&self, asset_id: &str) -> Result<usize> {
        let id_owned = asset_id.to_string();
        self.writer
            .exec(move |conn| {
                // Snapshots go first so the count is reported even without cascading FKs.
                let removed_snapshots = diesel::delete(
                    asset_snapshots::table.filter(asset_snapshots::asset_id.eq(&id_owned)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;

                let removed = diesel::delete(assets::table.find(&id_owned))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if removed == 0 {
                    return Err(StorageError::from(diesel::result::Error::NotFound).into());
                }

                Ok(removed_snapshots)
            })
            .await
    }

    fn get_by_id(&self, asset_id: &str) -> Result<Asset> {
        let mut conn = get_connection(&self.pool)?;

        let result = assets::table
            .select(AssetDB::as_select())
            .find(asset_id)
            .first::<AssetDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(Asset::try_from(result)?)
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Asset>> {
        let mut conn = get_connection(&self.pool)?;

        let results = assets::table
            .filter(assets::owner_id.eq(owner_id))
            .order((assets::created_at.asc(), assets::name.asc()))
            .select(AssetDB::as_select())
            .load::<AssetDB>(&mut conn)
            .map_err(StorageError::from)?;

        results
            .into_iter()
            .map(|row| Asset::try_from(row).map_err(Into::into))
            .collect()
    }

    fn list_owner_ids(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;

        assets::table
            .select(assets::owner_id)
            .distinct()
            .order(assets::owner_id.asc())
            .load::<String>(&mut conn)
            .into_core()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshots::SnapshotRepository;
    use crate::test_support::{create_test_db, date};
    use navfolio_core::assets::AssetKind;
    use navfolio_core::errors::DatabaseError;
    use navfolio_core::snapshots::{Snapshot, SnapshotRepositoryTrait};
    use navfolio_core::Error;
    use rust_decimal_macros::dec;

    fn new_asset(id: &str, owner_id: &str) -> NewAsset {
        NewAsset {
            id: Some(id.to_string()),
            owner_id: owner_id.to_string(),
            name: format!("{} name", id),
            code: Some("000001".to_string()),
            kind: AssetKind::Fund,
            currency: "CNY".to_string(),
            auto_update: true,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_starts_with_empty_holding() {
        let db = create_test_db();
        let repo = AssetRepository::new(db.pool.clone(), db.writer.clone());

        let asset = repo.create(new_asset("fund", "alice")).await.unwrap();
        assert_eq!(asset.kind, AssetKind::Fund);
        assert_eq!(asset.last_shares, Decimal::ZERO);
        assert_eq!(repo.get_by_id("fund").unwrap(), asset);

        let generated = repo
            .create(NewAsset {
                id: None,
                ..new_asset("ignored", "alice")
            })
            .await
            .unwrap();
        assert!(!generated.id.is_empty());
        assert_eq!(repo.list_by_owner("alice").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_keeps_holding() {
        let db = create_test_db();
        let repo = AssetRepository::new(db.pool.clone(), db.writer.clone());
        repo.create(new_asset("fund", "alice")).await.unwrap();

        let updated = repo
            .update(AssetUpdate {
                id: "fund".to_string(),
                name: "Index fund".to_string(),
                code: None,
                kind: AssetKind::Stock,
                currency: "USD".to_string(),
                auto_update: false,
                notes: Some("moved".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(updated.name, "Index fund");
        assert_eq!(updated.currency, "USD");
        assert_eq!(updated.owner_id, "alice");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_snapshots() {
        let db = create_test_db();
        let repo = AssetRepository::new(db.pool.clone(), db.writer.clone());
        let snapshots = SnapshotRepository::new(db.pool.clone(), db.writer.clone());
        repo.create(new_asset("fund", "alice")).await.unwrap();

        let day = |d: &str| Snapshot {
            id: Snapshot::make_id("fund", date(d)),
            asset_id: "fund".to_string(),
            date: date(d),
            amount: dec!(100),
            profit: Decimal::ZERO,
            cost: dec!(100),
            yield_rate: Decimal::ZERO,
            shares: dec!(100),
            unit_nav: dec!(1),
            is_cleared: false,
        };
        snapshots
            .upsert_snapshots(vec![day("2024-01-01"), day("2024-01-02")])
            .await
            .unwrap();

        assert_eq!(repo.delete("fund").await.unwrap(), 2);
        assert!(matches!(
            repo.get_by_id("fund"),
            Err(Error::Database(DatabaseError::NotFound(_)))
        ));
        assert!(matches!(
            repo.delete("fund").await,
            Err(Error::Database(DatabaseError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_owner_ids_are_distinct() {
        let db = create_test_db();
        let repo = AssetRepository::new(db.pool.clone(), db.writer.clone());
        repo.create(new_asset("a1", "bob")).await.unwrap();
        repo.create(new_asset("a2", "alice")).await.unwrap();
        repo.create(new_asset("a3", "alice")).await.unwrap();

        assert_eq!(
            repo.list_owner_ids().unwrap(),
            vec!["alice".to_string(), "bob".to_string()]
        );
    }
}
