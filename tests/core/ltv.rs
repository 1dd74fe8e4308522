use ltv_engine::core::error::LtvError;
use ltv_engine::plugins::ingest::Engine;
use ltv_engine::plugins::ltv::{CustomerLtv, SkipReason, evaluate_customers, top_customers_by_ltv};
use serde_json::{Value, json};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn customer(key: &str, last_name: &str) -> Value {
    json!({"type": "CUSTOMER", "verb": "NEW", "key": key,
           "event_time": "2021-01-01T00:00:00Z", "last_name": last_name})
}

fn visit(key: &str, customer: &str, day: &str) -> Value {
    json!({"type": "SITE_VISIT", "key": key, "event_time": format!("{}T12:00:00Z", day),
           "customer_id": customer, "tags": []})
}

fn order(key: &str, customer: &str, amount: &str) -> Value {
    json!({"type": "ORDER", "verb": "NEW", "key": key, "event_time": "2021-01-01T13:00:00Z",
           "customer_id": customer, "total_amount": amount})
}

#[test]
fn three_visits_over_three_weeks_scores_52000() {
    let mut engine = Engine::new();
    engine.ingest_values(&[
        customer("C1", "Doe"),
        visit("v1", "C1", "2021-01-01"),
        visit("v2", "C1", "2021-01-08"),
        visit("v3", "C1", "2021-01-22"),
        order("o1", "C1", "100.00 USD"),
        order("o2", "C1", "150.00 USD"),
        order("o3", "C1", "50.00 USD"),
    ]);

    let top = top_customers_by_ltv(engine.store(), 1).unwrap();
    assert_eq!(top.len(), 1);
    let record = &top[0];
    assert_eq!(record.customer_id, "C1");
    assert_eq!(record.last_name.as_deref(), Some("Doe"));
    assert_eq!(record.total_revenue, 300.0);
    assert_eq!(record.visits, 3);
    assert_eq!(record.ltv, 52_000);
}

#[test]
fn customer_without_visits_is_excluded() {
    let mut engine = Engine::new();
    engine.ingest_values(&[
        customer("c1", "Rich"),
        order("o1", "c1", "9999.00 USD"),
        customer("c2", "Modest"),
        visit("v1", "c2", "2021-01-01"),
        order("o2", "c2", "1.00 USD"),
    ]);

    let top = top_customers_by_ltv(engine.store(), 10).unwrap();
    let ids: Vec<&str> = top.iter().map(|r| r.customer_id.as_str()).collect();
    assert_eq!(ids, vec!["c2"]);

    let outcomes = evaluate_customers(engine.store());
    assert_eq!(
        outcomes[0],
        CustomerLtv::Skipped {
            customer_id: "c1".to_string(),
            reason: SkipReason::NoVisits
        }
    );
}

#[test]
fn customer_without_orders_is_excluded() {
    let mut engine = Engine::new();
    engine.ingest_values(&[customer("c1", "Browser"), visit("v1", "c1", "2021-01-01")]);

    assert!(top_customers_by_ltv(engine.store(), 5).unwrap().is_empty());
    assert!(matches!(
        evaluate_customers(engine.store())[0],
        CustomerLtv::Skipped {
            reason: SkipReason::NoOrders,
            ..
        }
    ));
}

#[test]
fn top_two_of_five_sorted_descending() {
    let mut events = Vec::new();
    for (i, amount) in ["10.00", "50.00", "30.00", "40.00", "20.00"].iter().enumerate() {
        let id = format!("c{}", i + 1);
        events.push(customer(&id, "Name"));
        events.push(visit(&format!("v{}", i + 1), &id, "2021-02-01"));
        events.push(order(&format!("o{}", i + 1), &id, &format!("{} USD", amount)));
    }
    let mut engine = Engine::new();
    engine.ingest_values(&events);

    let top = top_customers_by_ltv(engine.store(), 2).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].customer_id, "c2");
    assert_eq!(top[1].customer_id, "c4");
    assert!(top[0].ltv >= top[1].ltv);
    assert_eq!(top[0].ltv, 26_000);
    assert_eq!(top[1].ltv, 20_800);
}

#[test]
fn ranking_is_deterministic_and_ties_keep_insertion_order() {
    let mut engine = Engine::new();
    engine.ingest_values(&[
        customer("b", "Second"),
        customer("a", "First"),
        visit("v1", "a", "2021-01-01"),
        visit("v2", "b", "2021-01-01"),
        order("o1", "a", "10.00 USD"),
        order("o2", "b", "10.00 USD"),
    ]);

    let first = top_customers_by_ltv(engine.store(), 2).unwrap();
    let second = top_customers_by_ltv(engine.store(), 2).unwrap();
    assert_eq!(first, second);
    let ids: Vec<&str> = first.iter().map(|r| r.customer_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[test]
fn fixture_ranking_follows_updates() {
    let mut engine = Engine::new();
    engine.ingest_file(&fixture("events.json")).unwrap();

    let before = top_customers_by_ltv(engine.store(), 10).unwrap();
    let scores: Vec<(&str, i64)> = before
        .iter()
        .map(|r| (r.customer_id.as_str(), r.ltv))
        .collect();
    assert_eq!(scores, vec![("c1", 52_000), ("c2", 20_800)]);

    engine.ingest_file(&fixture("updates.json")).unwrap();
    let after = top_customers_by_ltv(engine.store(), 10).unwrap();
    assert_eq!(after[1].customer_id, "c2");
    assert_eq!(after[1].total_revenue, 90.0);
    assert_eq!(after[1].ltv, 46_800);
}

#[test]
fn zero_customers_requested_is_an_error() {
    let engine = Engine::new();
    assert!(matches!(
        top_customers_by_ltv(engine.store(), 0),
        Err(LtvError::ValidationError(_))
    ));
}
