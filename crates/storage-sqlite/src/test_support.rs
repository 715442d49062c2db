//! Temp-file databases for repository tests.

use chrono::NaiveDate;
use diesel::RunQueryDsl;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use crate::db::{create_pool, get_connection, run_migrations, spawn_writer, DbPool, WriteHandle};

pub struct TestDb {
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
    // Keeps the database file alive for the duration of the test.
    _dir: TempDir,
}

/// Creates a migrated database in a temp directory. Must run inside a Tokio
/// runtime because the writer actor is spawned.
pub fn create_test_db() -> TestDb {
    let dir = tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db").to_string_lossy().to_string();

    let pool = create_pool(&db_path).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone());

    TestDb {
        pool,
        writer,
        _dir: dir,
    }
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
}

/// Inserts an asset row directly so that foreign keys are satisfied.
pub fn insert_test_asset(pool: &DbPool, asset_id: &str, owner_id: &str, currency: &str) {
    let mut conn = get_connection(pool).expect("Failed to get connection");
    diesel::sql_query(format!(
        "INSERT INTO assets (id, owner_id, name, code, kind, currency, auto_update, last_shares, unit_cost, notes, created_at, updated_at) \
         VALUES ('{}', '{}', '{}', NULL, 'FUND', '{}', false, '0', '0', NULL, datetime('now'), datetime('now'))",
        asset_id, owner_id, asset_id, currency
    ))
    .execute(&mut conn)
    .expect("Failed to create test asset");
}
