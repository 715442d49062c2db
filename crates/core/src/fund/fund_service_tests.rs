use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::*;
use crate::assets::AssetKind;
use crate::cashflows::{CashflowCategory, CashflowRepositoryTrait, FlowDirection, NewCashflowEvent};
use crate::errors::Error;
use crate::events::{DomainEvent, MockDomainEventSink, NoOpDomainEventSink};
use crate::fx::FxService;
use crate::settings::{SettingsService, SettingsServiceTrait, SettingsUpdate};
use crate::test_support::{date, InMemoryStore};

struct Fixture {
    store: Arc<InMemoryStore>,
    sink: MockDomainEventSink,
    settings: Arc<SettingsService>,
    service: Arc<FundService>,
}

fn setup() -> Fixture {
    let store = InMemoryStore::new();
    let sink = MockDomainEventSink::new();
    let fx_service = Arc::new(FxService::new(store.clone(), Arc::new(NoOpDomainEventSink)));
    let settings = Arc::new(SettingsService::new(store.clone()));
    let service = Arc::new(FundService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        fx_service,
        settings.clone(),
        Arc::new(sink.clone()),
    ));
    store.add_asset("fund", "alice", AssetKind::Fund, "CNY");
    store.add_asset("cash", "alice", AssetKind::Cash, "CNY");
    Fixture {
        store,
        sink,
        settings,
        service,
    }
}

async fn add_flow(store: &InMemoryStore, day: &str, amount: Decimal, label: &str) {
    let direction = if amount.is_sign_negative() {
        FlowDirection::Expense
    } else {
        FlowDirection::Income
    };
    CashflowRepositoryTrait::create(
        store,
        NewCashflowEvent {
            id: None,
            owner_id: "alice".to_string(),
            date: date(day),
            direction,
            amount: amount.abs(),
            category: CashflowCategory::from_label(label),
            operator: None,
            note: None,
        },
    )
    .await
    .unwrap();
}

/// Days 1-3 of the worked example: a 5% gain, then a 1000 deposit.
async fn seed_worked_example(store: &InMemoryStore) {
    store.add_valuation("fund", "2024-01-01", dec!(6000));
    store.add_valuation("cash", "2024-01-01", dec!(4000));
    store.add_valuation("fund", "2024-01-02", dec!(6500));
    store.add_valuation("cash", "2024-01-02", dec!(4000));
    store.add_valuation("fund", "2024-01-03", dec!(6500));
    store.add_valuation("cash", "2024-01-03", dec!(5000));
    add_flow(store, "2024-01-03", dec!(1000), "salary").await;
}

#[tokio::test]
async fn test_no_snapshots_is_a_successful_no_op() {
    let f = setup();
    let outcome = f.service.recompute("alice").await;

    assert!(outcome.success);
    assert_eq!(outcome.row_count, 0);
    assert_eq!(outcome.message, "no data");
    assert_eq!(f.store.replace_calls.load(Ordering::SeqCst), 0);
    assert!(f.sink.is_empty());
    assert!(f.service.get_fund_summary("alice", None, None).unwrap().is_none());
}

#[tokio::test]
async fn test_worked_example_end_to_end() {
    let f = setup();
    seed_worked_example(&f.store).await;

    let outcome = f.service.recompute("alice").await;
    assert!(outcome.success);
    assert_eq!(outcome.row_count, 3);
    assert!(outcome.degraded_rates.is_empty());

    let history = f.service.get_fund_history("alice", None, None).unwrap();
    assert_eq!(history.len(), 3);

    assert_eq!(history[0].unit_nav, dec!(1));
    assert_eq!(history[0].total_shares, dec!(10000));
    assert_eq!(history[0].principal, dec!(10000));

    assert_eq!(history[1].daily_return, dec!(0.05));
    assert_eq!(history[1].unit_nav, dec!(1.05));
    assert_eq!(history[1].accumulated_profit, dec!(500));

    assert_eq!(history[2].daily_return, dec!(0));
    assert_eq!(history[2].unit_nav, dec!(1.05));
    assert_eq!(history[2].principal, dec!(11000));
    assert_eq!(history[2].accumulated_profit, dec!(500));
    assert_eq!(
        (history[2].total_shares - history[1].total_shares).round_dp(2),
        dec!(952.38)
    );

    assert_eq!(
        f.sink.events(),
        vec![DomainEvent::FundHistoryRecomputed {
            owner_id: "alice".to_string(),
            row_count: 3,
            degraded_rate_count: 0,
        }]
    );
}

#[tokio::test]
async fn test_internal_flows_do_not_move_the_series() {
    let f = setup();
    seed_worked_example(&f.store).await;
    f.service.recompute("alice").await;
    let before = f.service.get_fund_history("alice", None, None).unwrap();

    add_flow(&f.store, "2024-01-02", dec!(-700), "内部调仓").await;
    add_flow(&f.store, "2024-01-03", dec!(-300), "定投扣款").await;
    add_flow(&f.store, "2024-01-03", dec!(300), "internal rebalance").await;
    f.service.recompute("alice").await;

    assert_eq!(f.service.get_fund_history("alice", None, None).unwrap(), before);
}

#[tokio::test]
async fn test_foreign_rate_is_carried_forward() {
    let f = setup();
    f.store.add_asset("usd", "alice", AssetKind::Stock, "USD");
    f.store.add_rate("2024-01-01", "USD", dec!(7));
    for day in 1..=5 {
        f.store
            .add_valuation("usd", &format!("2024-01-0{}", day), dec!(100));
    }

    let outcome = f.service.recompute("alice").await;
    assert!(outcome.degraded_rates.is_empty());

    let history = f.service.get_fund_history("alice", None, None).unwrap();
    assert_eq!(history.len(), 5);
    for point in &history {
        assert_eq!(point.total_assets, dec!(700));
        assert_eq!(point.unit_nav, dec!(1));
    }
}

#[tokio::test]
async fn test_missing_rate_degrades_to_identity_and_is_reported() {
    let f = setup();
    f.store.add_asset("usd", "alice", AssetKind::Stock, "USD");
    f.store.add_valuation("usd", "2024-01-01", dec!(100));
    f.store.add_valuation("fund", "2024-01-01", dec!(900));

    let outcome = f.service.recompute("alice").await;

    assert!(outcome.success);
    assert_eq!(outcome.degraded_rates.len(), 1);
    assert_eq!(outcome.degraded_rates[0].currency, "USD");
    let latest = f.service.get_latest_point("alice").unwrap().unwrap();
    assert_eq!(latest.total_assets, dec!(1000));
}

#[tokio::test]
async fn test_base_currency_setting_is_used() {
    let f = setup();
    f.store.add_asset("usd", "alice", AssetKind::Stock, "USD");
    f.store.add_rate("2024-01-01", "CNY", dec!(0.125));
    f.store.add_valuation("usd", "2024-01-01", dec!(100));
    f.store.add_valuation("fund", "2024-01-01", dec!(800));
    f.settings
        .update_settings(&SettingsUpdate {
            base_currency: Some("USD".to_string()),
            quote_timeout_secs: None,
        })
        .await
        .unwrap();

    f.service.recompute("alice").await;

    let latest = f.service.get_latest_point("alice").unwrap().unwrap();
    assert_eq!(latest.total_assets, dec!(200));
}

#[tokio::test]
async fn test_recompute_is_idempotent() {
    let f = setup();
    seed_worked_example(&f.store).await;

    f.service.recompute("alice").await;
    let first = f.store.stored_history("alice");
    f.service.recompute("alice").await;
    let second = f.store.stored_history("alice");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_failed_recompute_keeps_previous_series() {
    let f = setup();
    seed_worked_example(&f.store).await;
    f.service.recompute("alice").await;
    let before = f.service.get_fund_history("alice", None, None).unwrap();

    f.store.add_valuation("fund", "2024-01-04", dec!(9000));
    f.store.fail_replace_history.store(true, Ordering::SeqCst);
    let outcome = f.service.recompute("alice").await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("disk full"));
    assert_eq!(f.service.get_fund_history("alice", None, None).unwrap(), before);

    let err = outcome.into_result().unwrap_err();
    assert!(matches!(err, Error::Calculation(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_recomputes_yield_one_consistent_series() {
    let f = setup();
    seed_worked_example(&f.store).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = f.service.clone();
        handles.push(tokio::spawn(async move { service.recompute("alice").await }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().success);
    }

    let history = f.store.stored_history("alice");
    assert_eq!(history.len(), 3);
    assert_eq!(f.store.replace_calls.load(Ordering::SeqCst), 8);
    assert_eq!(f.store.max_replaces_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(f.service.get_fund_history("alice", None, None).unwrap(), history);
}

#[tokio::test]
async fn test_cache_is_refreshed_after_recompute() {
    let f = setup();
    f.store.add_valuation("fund", "2024-01-01", dec!(100));
    f.service.recompute("alice").await;
    assert_eq!(f.service.get_fund_history("alice", None, None).unwrap().len(), 1);

    f.store.add_valuation("fund", "2024-01-02", dec!(110));
    // Still served from the cache until the next rebuild.
    assert_eq!(f.service.get_fund_history("alice", None, None).unwrap().len(), 1);

    f.service.recompute("alice").await;
    assert_eq!(f.service.get_fund_history("alice", None, None).unwrap().len(), 2);
}

#[tokio::test]
async fn test_history_range_and_summary() {
    let f = setup();
    seed_worked_example(&f.store).await;
    f.store.add_valuation("fund", "2024-01-04", dec!(5450));
    f.store.add_valuation("cash", "2024-01-04", dec!(5000));
    f.service.recompute("alice").await;

    let slice = f
        .service
        .get_fund_history("alice", Some(date("2024-01-02")), Some(date("2024-01-03")))
        .unwrap();
    assert_eq!(slice.len(), 2);

    let summary = f
        .service
        .get_fund_summary("alice", None, None)
        .unwrap()
        .unwrap();
    assert_eq!(summary.as_of, date("2024-01-04"));
    assert_eq!(summary.total_assets, dec!(10450));
    assert!(summary.max_drawdown < Decimal::ZERO);
    assert_eq!(summary.principal, dec!(11000));
    assert_eq!(summary.accumulated_profit, dec!(-550));
}

#[tokio::test]
async fn test_owners_are_isolated() {
    let f = setup();
    f.store.add_asset("bob-fund", "bob", AssetKind::Fund, "CNY");
    f.store.add_valuation("fund", "2024-01-01", dec!(100));
    f.store.add_valuation("bob-fund", "2024-01-01", dec!(999));

    f.service.recompute("alice").await;

    assert_eq!(f.store.stored_history("alice").len(), 1);
    assert!(f.store.stored_history("bob").is_empty());
    assert_eq!(
        f.service.get_latest_point("alice").unwrap().unwrap().total_assets,
        dec!(100)
    );
}
