//! SQLite storage implementation for auto-invest plans.

mod model;
mod repository;

pub use model::InvestmentPlanDB;
pub use repository::PlanRepository;
