//! Daily asset snapshots: balance-method entry, entry-screen defaults, and
//! the base-currency valuations fed to the fund series.

pub mod balance_method;
mod snapshot_model;
mod snapshot_service;
mod snapshot_traits;


pub use balance_method::{derive_from_balance, value_from_units, BalanceDerivation, UnitValuation};
pub use snapshot_model::{
    BalanceEntry, EntryRow, SaveSnapshotsResult, Snapshot, SnapshotValuation,
};
pub use snapshot_service::SnapshotService;
pub use snapshot_traits::{SnapshotRepositoryTrait, SnapshotServiceTrait};
