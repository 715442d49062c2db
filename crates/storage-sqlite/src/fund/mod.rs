//! SQLite storage implementation for the derived fund series.

mod model;
mod repository;

pub use model::FundHistoryDB;
pub use repository::FundHistoryRepository;
