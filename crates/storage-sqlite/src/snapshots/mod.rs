//! SQLite storage implementation for asset snapshots.

mod model;
mod repository;

pub use model::AssetSnapshotDB;
pub use repository::SnapshotRepository;
pub(crate) use repository::{write_holding, write_snapshots};
