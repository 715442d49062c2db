//! Auto-invest plans: scheduled purchases executed at most once per day,
//! and a projection of upcoming outflows.

mod plan_model;
mod plan_service;
mod plan_traits;


pub use plan_model::{
    ExecutedPlan, FailedPlan, InvestmentPlan, InvestmentPlanUpdate, NewInvestmentPlan,
    PlanExecution, PlanFrequency, PlanRunReport, PlannedOutflow,
};
pub use plan_service::{auto_invest_marker, PlanService};
pub use plan_traits::{PlanRepositoryTrait, PlanServiceTrait};
