use crate::core::error::LtvError;
use crate::core::event::{Event, Verb, parse_amount};
use crate::core::store::{Customer, Image, Keyed, Order, RecordStore, SiteVisit, Table};
use crate::core::time;
use crate::core::validate::dq_check;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;
use std::fs;
use std::path::Path;

/// Why a single event was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RejectReason {
    /// UPDATE for a key that does not exist yet.
    MissingKey,
    MalformedAmount(String),
    /// The wire object could not be decoded into an event.
    InvalidEvent(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingKey => write!(f, "Invalid record due to missing key"),
            RejectReason::MalformedAmount(detail) => write!(f, "Malformed amount: {}", detail),
            RejectReason::InvalidEvent(detail) => write!(f, "Invalid event: {}", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    /// The event in wire form.
    pub event: JsonValue,
    pub reason: RejectReason,
}

/// Effect of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Inserted,
    Updated,
    Duplicate,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionReport {
    pub batch_id: String,
    pub new: usize,
    pub updated: usize,
    pub rejected: usize,
    pub duplicate: usize,
    pub size_before: usize,
    pub size_after: usize,
    pub rejections: Vec<Rejection>,
}

impl IngestionReport {
    fn begin(size_before: usize) -> Self {
        Self {
            batch_id: time::new_event_id(),
            new: 0,
            updated: 0,
            rejected: 0,
            duplicate: 0,
            size_before,
            size_after: size_before,
            rejections: Vec::new(),
        }
    }

    /// Number of events seen in the batch.
    pub fn total(&self) -> usize {
        self.new + self.updated + self.rejected + self.duplicate
    }

    /// `wire` is only evaluated for rejected events.
    fn tally(&mut self, outcome: Outcome, wire: impl FnOnce() -> JsonValue) {
        match outcome {
            Outcome::Inserted => self.new += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Duplicate => self.duplicate += 1,
            Outcome::Rejected(reason) => self.reject(wire(), reason),
        }
    }

    fn reject(&mut self, event: JsonValue, reason: RejectReason) {
        self.rejected += 1;
        self.rejections.push(Rejection { event, reason });
    }
}

/// Owns the record store and applies event batches to it.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    store: RecordStore,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Apply `events` in order. Later events observe the effects of earlier
    /// ones in the same batch.
    pub fn ingest(&mut self, events: &[Event]) -> IngestionReport {
        let mut report = IngestionReport::begin(self.store.size());
        for event in events {
            let outcome = self.apply(event);
            report.tally(outcome, || event.to_value());
        }
        report.size_after = self.store.refresh_size();
        report
    }

    /// Decode and apply wire objects in order. Objects that do not decode are
    /// rejected without stopping the batch.
    pub fn ingest_values(&mut self, values: &[JsonValue]) -> IngestionReport {
        let mut report = IngestionReport::begin(self.store.size());
        for value in values {
            match Event::from_value(value) {
                Ok(event) => {
                    let outcome = self.apply(&event);
                    report.tally(outcome, || value.clone());
                }
                Err(detail) => report.reject(value.clone(), RejectReason::InvalidEvent(detail)),
            }
        }
        report.size_after = self.store.refresh_size();
        report
    }

    /// Ingest a JSON array document. Anything other than an array is refused
    /// before any event is applied.
    pub fn ingest_json(&mut self, text: &str) -> Result<IngestionReport, LtvError> {
        let doc: JsonValue = serde_json::from_str(text)?;
        match doc {
            JsonValue::Array(values) => Ok(self.ingest_values(&values)),
            other => Err(LtvError::ValidationError(format!(
                "event batch must be a JSON array, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn ingest_file(&mut self, path: &Path) -> Result<IngestionReport, LtvError> {
        if !path.exists() {
            return Err(LtvError::NotFound(format!(
                "event file {} does not exist",
                path.display()
            )));
        }
        let text = fs::read_to_string(path)?;
        self.ingest_json(&text)
    }

    /// Validate and apply a single event without touching the size counter.
    pub fn apply(&mut self, event: &Event) -> Outcome {
        if !dq_check(&self.store, event) {
            return Outcome::Rejected(RejectReason::MissingKey);
        }

        match event {
            Event::Customer(c) => match c.verb {
                Verb::New => insert_new(
                    &mut self.store.customers,
                    Customer {
                        key: c.key.clone(),
                        event_time: c.event_time.clone(),
                        last_name: c.last_name.clone(),
                        adr_city: c.adr_city.clone(),
                        adr_state: c.adr_state.clone(),
                    },
                ),
                Verb::Update => {
                    let updated = self.store.customers.update(&c.key, |row| {
                        row.event_time = c.event_time.clone();
                        if let Some(v) = &c.last_name {
                            row.last_name = Some(v.clone());
                        }
                        if let Some(v) = &c.adr_city {
                            row.adr_city = Some(v.clone());
                        }
                        if let Some(v) = &c.adr_state {
                            row.adr_state = Some(v.clone());
                        }
                    });
                    updated_or_missing(updated)
                }
            },
            Event::SiteVisit(v) => insert_new(
                &mut self.store.site_visits,
                SiteVisit {
                    key: v.key.clone(),
                    event_time: v.event_time.clone(),
                    customer_id: v.customer_id.clone(),
                },
            ),
            Event::Image(i) => insert_new(
                &mut self.store.images,
                Image {
                    key: i.key.clone(),
                    event_time: i.event_time.clone(),
                    customer_id: i.customer_id.clone(),
                    camera_make: i.camera_make.clone(),
                    camera_model: i.camera_model.clone(),
                },
            ),
            Event::Order(o) => {
                if o.verb == Verb::New && self.store.orders.contains(&o.key) {
                    return Outcome::Duplicate;
                }
                let total_amount = match o.total_amount.as_deref().map(parse_amount).transpose() {
                    Ok(amount) => amount,
                    Err(detail) => return Outcome::Rejected(RejectReason::MalformedAmount(detail)),
                };
                match o.verb {
                    Verb::New => {
                        let (Some(customer_id), Some(total_amount)) = (&o.customer_id, total_amount)
                        else {
                            return Outcome::Rejected(RejectReason::InvalidEvent(
                                "ORDER/NEW needs customer_id and total_amount".to_string(),
                            ));
                        };
                        insert_new(
                            &mut self.store.orders,
                            Order {
                                key: o.key.clone(),
                                event_time: o.event_time.clone(),
                                customer_id: customer_id.clone(),
                                total_amount,
                            },
                        )
                    }
                    Verb::Update => {
                        let updated = self.store.orders.update(&o.key, |row| {
                            row.event_time = o.event_time.clone();
                            if let Some(v) = &o.customer_id {
                                row.customer_id = v.clone();
                            }
                            if let Some(amount) = total_amount {
                                row.total_amount = amount;
                            }
                        });
                        updated_or_missing(updated)
                    }
                }
            }
        }
    }
}

fn insert_new<R: Keyed>(table: &mut Table<R>, row: R) -> Outcome {
    if table.insert(row) {
        Outcome::Inserted
    } else {
        Outcome::Duplicate
    }
}

fn updated_or_missing(updated: bool) -> Outcome {
    if updated {
        Outcome::Updated
    } else {
        Outcome::Rejected(RejectReason::MissingKey)
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "ingest",
        "version": "0.1.0",
        "description": "Validate, deduplicate and upsert typed business events",
        "commands": [
            { "name": "report", "parameters": ["events", "top"] },
            { "name": "display", "parameters": ["events"] }
        ],
        "event_types": ["CUSTOMER", "ORDER", "IMAGE", "SITE_VISIT"],
        "verbs": ["NEW", "UPDATE"],
        "storage": []
    })
}
