//! Navfolio Core - Domain entities, services, and traits.
//!
//! This crate holds the unit-accounting logic for a household fund: assets are
//! valued in their own currency, normalized to a base currency, and the daily
//! totals are turned into a fund-style NAV series that is insensitive to money
//! moving in and out. It is database-agnostic and defines traits that are
//! implemented by the `storage-sqlite` crate.

pub mod assets;
pub mod cashflows;
pub mod constants;
pub mod errors;
pub mod events;
pub mod fund;
pub mod fx;
pub mod planning;
pub mod plans;
pub mod quotes;
pub mod settings;
pub mod snapshots;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the types most callers need
pub use assets::{Asset, AssetKind};
pub use cashflows::{CashflowCategory, CashflowEvent, FlowDirection};
pub use fund::{FundHistoryPoint, RecomputeOutcome, RecomputeTrigger};
pub use snapshots::Snapshot;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
