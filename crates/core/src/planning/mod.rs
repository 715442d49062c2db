//! Planning figures over the latest holdings: a FIRE projection under the
//! safe-withdrawal rule and rebalance advice against target allocations.

mod fire_projection;
mod planning_model;
mod planning_service;
mod planning_traits;
mod rebalance;


pub use fire_projection::project_fire;
pub use planning_model::{
    FireAssumptions, FireProjection, FireProjectionRow, GroupHolding, LatestHoldings,
    RebalanceAdvice, RebalanceGrouping, RebalanceLine, RebalanceTarget,
};
pub use planning_service::PlanningService;
pub use planning_traits::PlanningServiceTrait;
pub use rebalance::compute_rebalance;
