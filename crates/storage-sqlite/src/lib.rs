//! SQLite storage implementation for Navfolio.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `navfolio-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for all domain entities
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! `core` is database-agnostic and works with traits.
//!
//! ```text
//!           core (domain)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```
//!
//! Reads go through the r2d2 pool. Every write goes through the single writer
//! actor (`WriteHandle`), which runs each job in one immediate transaction.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Repository implementations
pub mod assets;
pub mod cashflows;
pub mod fund;
pub mod fx;
pub mod plans;
pub mod settings;
pub mod snapshots;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export repositories
pub use assets::AssetRepository;
pub use cashflows::CashflowRepository;
pub use fund::FundHistoryRepository;
pub use fx::FxRepository;
pub use plans::PlanRepository;
pub use settings::SettingsRepository;
pub use snapshots::SnapshotRepository;

// Re-export from navfolio-core for convenience
pub use navfolio_core::errors::{DatabaseError, Error, Result};
