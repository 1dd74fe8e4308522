use ltv_engine::core::error::LtvError;
use ltv_engine::core::event::{Event, EventTime, OrderEvent, Verb};
use ltv_engine::core::store::RecordStore;
use ltv_engine::plugins::ingest::{Engine, Outcome, RejectReason};
use serde_json::json;
use std::collections::HashSet;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn assert_unique_keys(store: &RecordStore) {
    let customers: HashSet<&str> = store.customers.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(customers.len(), store.customers.len());
    let orders: HashSet<&str> = store.orders.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(orders.len(), store.orders.len());
    let images: HashSet<&str> = store.images.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(images.len(), store.images.len());
    let visits: HashSet<&str> = store.site_visits.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(visits.len(), store.site_visits.len());
}

#[test]
fn fixture_batch_counts_and_size() {
    let mut engine = Engine::new();
    let report = engine.ingest_file(&fixture("events.json")).unwrap();

    assert_eq!(report.new, 13);
    assert_eq!(report.updated, 0);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.duplicate, 1);
    assert_eq!(report.total(), 15);
    assert_eq!(report.size_before, 0);
    assert_eq!(report.size_after, 13);

    let store = engine.store();
    assert_eq!(store.customers.len(), 3);
    assert_eq!(store.site_visits.len(), 4);
    assert_eq!(store.images.len(), 1);
    assert_eq!(store.orders.len(), 5);
    assert_eq!(store.size(), store.row_count());
    assert_unique_keys(store);

    assert_eq!(report.rejections.len(), 1);
    assert_eq!(report.rejections[0].reason, RejectReason::MissingKey);
    assert_eq!(report.rejections[0].event["key"], "c9");
    assert!(store.customers.get("c9").is_none());
}

#[test]
fn second_batch_updates_and_rejects_malformed_amount() {
    let mut engine = Engine::new();
    engine.ingest_file(&fixture("events.json")).unwrap();
    let report = engine.ingest_file(&fixture("updates.json")).unwrap();

    assert_eq!(report.new, 0);
    assert_eq!(report.updated, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.duplicate, 1);
    assert_eq!((report.size_before, report.size_after), (13, 13));
    assert!(matches!(
        report.rejections[0].reason,
        RejectReason::MalformedAmount(_)
    ));

    let store = engine.store();
    assert_eq!(store.orders.get("o4").unwrap().total_amount, 90.0);
    assert!(store.orders.get("o6").is_none());
    let c2 = store.customers.get("c2").unwrap();
    assert_eq!(c2.adr_city.as_deref(), Some("Chicago"));
    assert_eq!(c2.last_name.as_deref(), Some("Jones"));
    assert_unique_keys(store);
}

#[test]
fn duplicate_new_is_idempotent() {
    let event = json!({
        "type": "IMAGE", "key": "i1", "event_time": "2021-03-01T00:00:00Z",
        "customer_id": "c1", "camera_make": "Nikon"
    });
    let mut engine = Engine::new();
    let first = engine.ingest_values(&[event.clone()]);
    let second = engine.ingest_values(&[event]);

    assert_eq!((first.new, first.duplicate), (1, 0));
    assert_eq!((second.new, second.duplicate), (0, 1));
    assert_eq!(second.rejected, 0);
    assert_eq!(engine.store().images.len(), 1);
}

#[test]
fn update_for_unseen_key_never_creates_a_row() {
    let mut engine = Engine::new();
    let report = engine.ingest_values(&[
        json!({"type": "ORDER", "verb": "UPDATE", "key": "o-new", "event_time": "2021-01-01",
               "customer_id": "c1", "total_amount": "5.00 USD"}),
        json!({"type": "CUSTOMER", "verb": "UPDATE", "key": "c-new", "event_time": "2021-01-01"}),
    ]);
    assert_eq!(report.rejected, 2);
    assert!(
        report
            .rejections
            .iter()
            .all(|r| r.reason == RejectReason::MissingKey)
    );
    assert_eq!(engine.store().row_count(), 0);
}

#[test]
fn amount_is_stored_as_number() {
    let mut engine = Engine::new();
    let event = Event::Order(OrderEvent {
        verb: Verb::New,
        key: "o1".to_string(),
        event_time: EventTime::parse("2021-05-05T05:05:05Z").unwrap(),
        customer_id: Some("c1".to_string()),
        total_amount: Some("199.99 USD".to_string()),
    });
    assert_eq!(engine.apply(&event), Outcome::Inserted);

    let stored = engine.store().orders.get("o1").unwrap().total_amount;
    assert_eq!(stored, 199.99);
    assert_eq!(format!("{:.2}", stored).parse::<f64>().unwrap(), 199.99);
}

#[test]
fn typed_batch_matches_wire_batch() {
    let wire = vec![
        json!({"type": "CUSTOMER", "verb": "NEW", "key": "c1", "event_time": "2021-01-01"}),
        json!({"type": "SITE_VISIT", "key": "v1", "event_time": "2021-01-01", "customer_id": "c1"}),
    ];
    let typed: Vec<Event> = wire.iter().map(|v| Event::from_value(v).unwrap()).collect();

    let mut a = Engine::new();
    let mut b = Engine::new();
    let ra = a.ingest_values(&wire);
    let rb = b.ingest(&typed);
    assert_eq!((ra.new, ra.size_after), (rb.new, rb.size_after));
}

#[test]
fn missing_file_and_bad_document_are_errors() {
    let mut engine = Engine::new();
    assert!(matches!(
        engine.ingest_file(&fixture("does-not-exist.json")),
        Err(LtvError::NotFound(_))
    ));
    assert!(matches!(
        engine.ingest_json("[{\"type\": "),
        Err(LtvError::JsonError(_))
    ));
    assert!(matches!(
        engine.ingest_json("42"),
        Err(LtvError::ValidationError(_))
    ));
}

#[test]
fn partial_order_update_changes_only_given_fields() {
    let mut engine = Engine::new();
    engine.ingest_file(&fixture("events.json")).unwrap();
    let before = engine.store().orders.get("o1").unwrap().clone();

    let report = engine.ingest_values(&[json!({
        "type": "ORDER", "verb": "UPDATE", "key": "o1",
        "event_time": "2021-01-09T00:00:00Z", "total_amount": "20.00 USD"
    })]);

    assert_eq!((report.updated, report.rejected), (1, 0));
    let after = engine.store().orders.get("o1").unwrap();
    assert_eq!(after.total_amount, 20.0);
    assert_eq!(after.customer_id, before.customer_id);
    assert_eq!(after.event_time.as_str(), "2021-01-09T00:00:00Z");
}
