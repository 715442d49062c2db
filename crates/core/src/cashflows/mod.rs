//! Cash-flow events and their classification into external and internal flows.

mod cashflow_model;
mod cashflow_service;
mod cashflow_traits;
pub mod flow_classifier;

#[cfg(test)]
mod cashflow_service_tests;

pub use cashflow_model::{
    CashflowCategory, CashflowEvent, CashflowUpdate, FlowDirection, FlowTotals,
    NewCashflowEvent, AUTO_INVEST_DEDUCTION_LABEL, INTERNAL_REBALANCE_LABEL,
};
pub use cashflow_service::CashflowService;
pub use cashflow_traits::{CashflowRepositoryTrait, CashflowServiceTrait};
pub use flow_classifier::{classify_flow, is_external_flow, net_external_flows_by_date, FlowType};
