use async_trait::async_trait;
use chrono::NaiveDate;

use super::plan_model::{
    InvestmentPlan, InvestmentPlanUpdate, NewInvestmentPlan, PlanExecution, PlanRunReport,
    PlannedOutflow,
};
use crate::errors::Result;

#[async_trait]
pub trait PlanRepositoryTrait: Send + Sync {
    async fn create(&self, new_plan: NewInvestmentPlan) -> Result<InvestmentPlan>;

    async fn update(&self, update: InvestmentPlanUpdate) -> Result<InvestmentPlan>;

    async fn delete(&self, plan_id: &str) -> Result<usize>;

    fn get_by_id(&self, plan_id: &str) -> Result<InvestmentPlan>;

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<InvestmentPlan>>;

    /// Applies the holding updates, the source snapshot and the cash-flow
    /// record of one execution in a single transaction.
    async fn record_execution(&self, execution: PlanExecution) -> Result<()>;
}

#[async_trait]
pub trait PlanServiceTrait: Send + Sync {
    fn get_plans(&self, owner_id: &str) -> Result<Vec<InvestmentPlan>>;

    async fn create_plan(&self, new_plan: NewInvestmentPlan) -> Result<InvestmentPlan>;

    async fn update_plan(&self, update: InvestmentPlanUpdate) -> Result<InvestmentPlan>;

    async fn delete_plan(&self, plan_id: &str) -> Result<()>;

    /// Runs every active plan of the owner that is due on `date` and has not
    /// run yet that day.
    async fn execute_due_plans(&self, owner_id: &str, date: NaiveDate) -> Result<PlanRunReport>;

    /// Plan occurrences from `start` over the next `days` days (30 when
    /// `None`), in base currency.
    fn project_outflows(
        &self,
        owner_id: &str,
        start: NaiveDate,
        days: Option<u32>,
    ) -> Result<Vec<PlannedOutflow>>;
}
