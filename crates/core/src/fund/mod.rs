//! Fund series: daily aggregation, the unit-NAV recurrence, the recompute
//! trigger, and the dashboard read model.

mod daily_aggregator;
pub mod fund_metrics;
mod fund_model;
mod fund_service;
mod fund_traits;
mod nav_engine;

#[cfg(test)]
mod fund_service_tests;

pub use daily_aggregator::aggregate_daily_totals;
pub use fund_model::{
    DailyTotal, DrawdownWindow, FundHistoryPoint, FundSummary, RecomputeOutcome,
};
pub use fund_service::FundService;
pub use fund_traits::{FundHistoryRepositoryTrait, FundServiceTrait, RecomputeTrigger};
pub use nav_engine::{compute_fund_history, NavState};
