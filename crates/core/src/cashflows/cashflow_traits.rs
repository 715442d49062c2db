use async_trait::async_trait;
use chrono::NaiveDate;

use super::cashflow_model::{CashflowEvent, CashflowUpdate, FlowTotals, NewCashflowEvent};
use crate::errors::Result;

#[async_trait]
pub trait CashflowRepositoryTrait: Send + Sync {
    async fn create(&self, new_event: NewCashflowEvent) -> Result<CashflowEvent>;

    async fn update(&self, update: CashflowUpdate) -> Result<CashflowEvent>;

    async fn delete(&self, cashflow_id: &str) -> Result<usize>;

    fn get_by_id(&self, cashflow_id: &str) -> Result<CashflowEvent>;

    /// All events of an owner ordered by date.
    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<CashflowEvent>>;

    fn list_by_owner_and_date(&self, owner_id: &str, date: NaiveDate)
        -> Result<Vec<CashflowEvent>>;
}

#[async_trait]
pub trait CashflowServiceTrait: Send + Sync {
    /// Events of an owner, newest first; internal transfers only when asked.
    fn get_cashflows(&self, owner_id: &str, include_internal: bool) -> Result<Vec<CashflowEvent>>;

    /// External income and expense between `start` and `end`, inclusive.
    fn get_flow_totals(&self, owner_id: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FlowTotals>;

    async fn create_cashflow(&self, new_event: NewCashflowEvent) -> Result<CashflowEvent>;

    async fn update_cashflow(&self, update: CashflowUpdate) -> Result<CashflowEvent>;

    async fn delete_cashflow(&self, cashflow_id: &str) -> Result<()>;
}
