use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::*;
use crate::events::{DomainEvent, MockDomainEventSink};
use crate::test_support::{date, InMemoryStore, RecordingTrigger};

struct Fixture {
    trigger: Arc<RecordingTrigger>,
    sink: MockDomainEventSink,
    service: CashflowService,
}

fn setup() -> Fixture {
    let store = InMemoryStore::new();
    let trigger = RecordingTrigger::new();
    let sink = MockDomainEventSink::new();
    let service = CashflowService::new(store, trigger.clone(), Arc::new(sink.clone()));
    Fixture {
        trigger,
        sink,
        service,
    }
}

fn event(day: &str, direction: FlowDirection, amount: Decimal, label: &str) -> NewCashflowEvent {
    NewCashflowEvent {
        id: None,
        owner_id: "alice".to_string(),
        date: date(day),
        direction,
        amount,
        category: CashflowCategory::from_label(label),
        operator: None,
        note: None,
    }
}

#[tokio::test]
async fn test_every_write_recomputes() {
    let f = setup();

    let created = f
        .service
        .create_cashflow(event("2024-01-02", FlowDirection::Income, dec!(1000), "salary"))
        .await
        .unwrap();
    f.service
        .update_cashflow(CashflowUpdate {
            id: created.id.clone(),
            date: created.date,
            direction: FlowDirection::Income,
            amount: dec!(1200),
            category: created.category.clone(),
            operator: Some("bob".to_string()),
            note: None,
        })
        .await
        .unwrap();
    f.service.delete_cashflow(&created.id).await.unwrap();

    assert_eq!(f.trigger.calls().len(), 3);
    assert_eq!(f.sink.len(), 3);
    assert!(f
        .sink
        .events()
        .iter()
        .all(|e| matches!(e, DomainEvent::CashflowsChanged { .. })));
}

#[tokio::test]
async fn test_negative_amount_is_rejected() {
    let f = setup();
    let result = f
        .service
        .create_cashflow(event("2024-01-02", FlowDirection::Expense, dec!(-5), "rent"))
        .await;
    assert!(result.is_err());
    assert!(f.trigger.calls().is_empty());
}

#[tokio::test]
async fn test_listing_hides_internal_transfers_unless_asked() {
    let f = setup();
    for (day, label) in [
        ("2024-01-01", "salary"),
        ("2024-01-03", AUTO_INVEST_DEDUCTION_LABEL),
        ("2024-01-02", INTERNAL_REBALANCE_LABEL),
    ] {
        f.service
            .create_cashflow(event(day, FlowDirection::Expense, dec!(10), label))
            .await
            .unwrap();
    }

    let external = f.service.get_cashflows("alice", false).unwrap();
    assert_eq!(external.len(), 1);
    assert_eq!(external[0].category, CashflowCategory::External("salary".into()));

    let all = f.service.get_cashflows("alice", true).unwrap();
    let dates: Vec<_> = all.iter().map(|e| e.date).collect();
    assert_eq!(
        dates,
        vec![date("2024-01-03"), date("2024-01-02"), date("2024-01-01")]
    );
}

#[tokio::test]
async fn test_flow_totals_count_external_flows_in_range() {
    let f = setup();
    let flows = [
        ("2024-01-01", FlowDirection::Income, dec!(1000), "salary"),
        ("2024-01-05", FlowDirection::Expense, dec!(300), "rent"),
        ("2024-01-05", FlowDirection::Expense, dec!(500), AUTO_INVEST_DEDUCTION_LABEL),
        ("2024-02-01", FlowDirection::Income, dec!(50), "bonus"),
    ];
    for (day, direction, amount, label) in flows {
        f.service
            .create_cashflow(event(day, direction, amount, label))
            .await
            .unwrap();
    }

    let totals = f
        .service
        .get_flow_totals("alice", date("2024-01-01"), date("2024-01-31"))
        .unwrap();
    assert_eq!(
        totals,
        FlowTotals {
            income: dec!(1000),
            expense: dec!(300),
            net: dec!(700),
        }
    );
}

#[tokio::test]
async fn test_delete_unknown_event_fails_without_recompute() {
    let f = setup();
    assert!(f.service.delete_cashflow("missing").await.is_err());
    assert!(f.trigger.calls().is_empty());
}

#[tokio::test]
async fn test_flow_totals_report_overflow() {
    let f = setup();
    for label in ["salary", "bonus"] {
        f.service
            .create_cashflow(event("2024-01-02", FlowDirection::Income, Decimal::MAX, label))
            .await
            .unwrap();
    }

    let result = f
        .service
        .get_flow_totals("alice", date("2024-01-01"), date("2024-01-31"));
    assert!(matches!(
        result,
        Err(crate::Error::Calculation(crate::errors::CalculatorError::Overflow { .. }))
    ));
}
