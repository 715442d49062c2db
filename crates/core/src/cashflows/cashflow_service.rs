use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use std::sync::Arc;

use super::cashflow_model::{CashflowEvent, CashflowUpdate, FlowTotals, NewCashflowEvent};
use super::cashflow_traits::{CashflowRepositoryTrait, CashflowServiceTrait};
use super::flow_classifier::is_external_flow;
use super::FlowDirection;
use crate::errors::Result;
use crate::utils::decimal_utils::checked;
use crate::events::{DomainEvent, DomainEventSink};
use crate::fund::RecomputeTrigger;

/// Every committed cash-flow write rebuilds the owner's fund series.
pub struct CashflowService {
    repository: Arc<dyn CashflowRepositoryTrait>,
    recompute_trigger: Arc<dyn RecomputeTrigger>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl CashflowService {
    pub fn new(
        repository: Arc<dyn CashflowRepositoryTrait>,
        recompute_trigger: Arc<dyn RecomputeTrigger>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            repository,
            recompute_trigger,
            event_sink,
        }
    }

    async fn after_write(&self, owner_id: &str, cashflow_id: &str) -> Result<()> {
        self.event_sink.emit(DomainEvent::cashflows_changed(
            owner_id,
            vec![cashflow_id.to_string()],
        ));
        self.recompute_trigger
            .recompute(owner_id)
            .await
            .into_result()?;
        Ok(())
    }
}

#[async_trait]
impl CashflowServiceTrait for CashflowService {
    fn get_cashflows(&self, owner_id: &str, include_internal: bool) -> Result<Vec<CashflowEvent>> {
        let mut events: Vec<CashflowEvent> = self
            .repository
            .list_by_owner(owner_id)?
            .into_iter()
            .filter(|e| include_internal || is_external_flow(e))
            .collect();
        events.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(events)
    }

    fn get_flow_totals(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FlowTotals> {
        let mut totals = FlowTotals::default();
        for event in self
            .repository
            .list_by_owner(owner_id)?
            .iter()
            .filter(|e| e.date >= start && e.date <= end && is_external_flow(e))
        {
            match event.direction {
                FlowDirection::Income => {
                    totals.income =
                        checked(totals.income.checked_add(event.amount), "income total", event.date)?
                }
                FlowDirection::Expense => {
                    totals.expense =
                        checked(totals.expense.checked_add(event.amount), "expense total", event.date)?
                }
            }
        }
        totals.net = checked(totals.income.checked_sub(totals.expense), "net flow total", end)?;
        Ok(totals)
    }

    async fn create_cashflow(&self, new_event: NewCashflowEvent) -> Result<CashflowEvent> {
        new_event.validate()?;
        let event = self.repository.create(new_event).await?;
        debug!(
            "Recorded {:?} of {} ({}) for {} on {}",
            event.direction, event.amount, event.category, event.owner_id, event.date
        );
        self.after_write(&event.owner_id, &event.id).await?;
        Ok(event)
    }

    async fn update_cashflow(&self, update: CashflowUpdate) -> Result<CashflowEvent> {
        update.validate()?;
        let event = self.repository.update(update).await?;
        self.after_write(&event.owner_id, &event.id).await?;
        Ok(event)
    }

    async fn delete_cashflow(&self, cashflow_id: &str) -> Result<()> {
        let event = self.repository.get_by_id(cashflow_id)?;
        self.repository.delete(cashflow_id).await?;
        self.after_write(&event.owner_id, &event.id).await
    }
}
