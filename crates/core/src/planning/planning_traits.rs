//! Service trait for forward-looking planning figures.

use super::planning_model::{
    FireAssumptions, FireProjection, LatestHoldings, RebalanceAdvice, RebalanceGrouping,
    RebalanceTarget,
};
use crate::errors::Result;

pub trait PlanningServiceTrait: Send + Sync {
    /// Base-currency value of every asset on the owner's latest snapshot day.
    fn get_latest_holdings(&self, owner_id: &str) -> Result<LatestHoldings>;

    /// Projects from `assumptions.base_amount`, or from the latest total when absent.
    fn project_fire(&self, owner_id: &str, assumptions: &FireAssumptions) -> Result<FireProjection>;

    /// Trades that bring the latest holdings back to `targets`.
    fn get_rebalance_advice(
        &self,
        owner_id: &str,
        grouping: &RebalanceGrouping,
        targets: &[RebalanceTarget],
    ) -> Result<RebalanceAdvice>;
}
