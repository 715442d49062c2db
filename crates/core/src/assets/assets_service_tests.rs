use rust_decimal_macros::dec;
use std::sync::Arc;

use super::*;
use crate::errors::{CalculatorError, Error};
use crate::events::{DomainEvent, MockDomainEventSink};
use crate::test_support::{InMemoryStore, RecordingTrigger};
use std::sync::atomic::Ordering;

struct Fixture {
    store: Arc<InMemoryStore>,
    trigger: Arc<RecordingTrigger>,
    sink: MockDomainEventSink,
    service: AssetService,
}

fn setup() -> Fixture {
    let store = InMemoryStore::new();
    let trigger = RecordingTrigger::new();
    let sink = MockDomainEventSink::new();
    let service = AssetService::new(store.clone(), trigger.clone(), Arc::new(sink.clone()));
    Fixture {
        store,
        trigger,
        sink,
        service,
    }
}

fn new_fund(owner: &str, name: &str, currency: &str) -> NewAsset {
    NewAsset {
        owner_id: owner.to_string(),
        name: name.to_string(),
        code: Some(" 110011 ".to_string()),
        kind: AssetKind::Fund,
        currency: currency.to_string(),
        auto_update: true,
        ..Default::default()
    }
}

fn update_of(asset: &Asset, currency: &str) -> AssetUpdate {
    AssetUpdate {
        id: asset.id.clone(),
        name: asset.name.clone(),
        code: asset.code.clone(),
        kind: asset.kind,
        currency: currency.to_string(),
        auto_update: asset.auto_update,
        notes: Some("renamed".to_string()),
    }
}

#[tokio::test]
async fn test_create_normalizes_without_recompute() {
    let f = setup();

    let asset = f
        .service
        .create_asset(new_fund("alice", "  Index Fund ", "usd"))
        .await
        .unwrap();

    assert_eq!(asset.name, "Index Fund");
    assert_eq!(asset.currency, "USD");
    assert_eq!(asset.code.as_deref(), Some("110011"));
    assert_eq!(asset.last_shares, dec!(0));
    assert!(f.trigger.calls().is_empty());
    assert!(matches!(
        f.sink.events().as_slice(),
        [DomainEvent::AssetsChanged { owner_id, .. }] if owner_id == "alice"
    ));
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let f = setup();
    assert!(f
        .service
        .create_asset(new_fund("alice", " ", "CNY"))
        .await
        .is_err());
    assert!(f
        .service
        .create_asset(new_fund("alice", "Fund", "yuan"))
        .await
        .is_err());
    assert!(f.service.get_assets("alice").unwrap().is_empty());
}

#[tokio::test]
async fn test_currency_change_triggers_recompute() {
    let f = setup();
    let asset = f
        .service
        .create_asset(new_fund("alice", "Fund", "CNY"))
        .await
        .unwrap();

    f.service.update_asset(update_of(&asset, "CNY")).await.unwrap();
    assert!(f.trigger.calls().is_empty());

    let updated = f.service.update_asset(update_of(&asset, "usd")).await.unwrap();
    assert_eq!(updated.currency, "USD");
    assert_eq!(f.trigger.calls(), vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_delete_cascades_snapshots_and_recomputes() {
    let f = setup();
    let asset = f
        .service
        .create_asset(new_fund("alice", "Fund", "CNY"))
        .await
        .unwrap();
    f.store.add_valuation(&asset.id, "2024-01-01", dec!(100));
    f.store.add_valuation(&asset.id, "2024-01-02", dec!(110));

    f.service.delete_asset(&asset.id).await.unwrap();

    assert!(f.service.get_asset(&asset.id).is_err());
    assert!(f.store.snapshot(&asset.id, "2024-01-01").is_none());
    assert_eq!(f.trigger.calls(), vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_failed_recompute_surfaces_after_commit() {
    let f = setup();
    let asset = f
        .service
        .create_asset(new_fund("alice", "Fund", "CNY"))
        .await
        .unwrap();
    f.trigger.fail.store(true, Ordering::SeqCst);

    let err = f.service.delete_asset(&asset.id).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Calculation(CalculatorError::RecomputeFailed { ref owner_id, .. }) if owner_id == "alice"
    ));
    // The delete itself was committed.
    assert!(f.service.get_asset(&asset.id).is_err());
}

#[tokio::test]
async fn test_get_assets_is_scoped_to_owner() {
    let f = setup();
    f.service
        .create_asset(new_fund("alice", "A", "CNY"))
        .await
        .unwrap();
    f.service
        .create_asset(new_fund("bob", "B", "CNY"))
        .await
        .unwrap();

    let names: Vec<String> = f
        .service
        .get_assets("bob")
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, vec!["B".to_string()]);
}
