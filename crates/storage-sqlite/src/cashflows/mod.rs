//! SQLite storage implementation for cash-flow events.

mod model;
mod repository;

pub use model::CashflowDB;
pub use repository::CashflowRepository;
pub(crate) use repository::insert_cashflow;
