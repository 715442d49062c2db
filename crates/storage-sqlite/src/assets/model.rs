//! Database models for assets.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use navfolio_core::assets::{Asset, AssetKind};

use crate::errors::StorageError;
use crate::utils::decimal_from_db;

/// Database model for assets
#[derive(
    Queryable,
    Identifiable,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::assets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct AssetDB {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub code: Option<String>,
    pub kind: String,
    pub currency: String,
    pub auto_update: bool,
    pub last_shares: String,
    pub unit_cost: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for inserting an asset
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::assets)]
pub struct NewAssetDB {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub code: Option<String>,
    pub kind: String,
    pub currency: String,
    pub auto_update: bool,
    pub last_shares: String,
    pub unit_cost: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<AssetDB> for Asset {
    type Error = StorageError;

    fn try_from(db: AssetDB) -> Result<Self, Self::Error> {
        Ok(Self {
            last_shares: decimal_from_db(&db.last_shares, "last_shares")?,
            unit_cost: decimal_from_db(&db.unit_cost, "unit_cost")?,
            kind: AssetKind::from_db_str(&db.kind),
            id: db.id,
            owner_id: db.owner_id,
            name: db.name,
            code: db.code,
            currency: db.currency,
            auto_update: db.auto_update,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
