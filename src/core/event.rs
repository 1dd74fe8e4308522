//! Typed business events and their wire decoding.
//!
//! A batch arrives as a JSON array of objects discriminated by `type`. Each
//! object is decoded into exactly one [`Event`] variant with a fixed field set,
//! so unknown fields, unknown types and missing required fields are rejected
//! here and never reach the ingestion engine.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// Width of the unit suffix carried by `total_amount` (e.g. `" USD"`).
pub const AMOUNT_SUFFIX_CHARS: usize = 4;

/// Mutation requested by a CUSTOMER or ORDER event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    New,
    Update,
}

/// An event timestamp as received, plus the calendar date of its
/// `YYYY-MM-DD` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTime {
    raw: String,
    date: NaiveDate,
}

impl EventTime {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let prefix = raw
            .get(..10)
            .ok_or_else(|| format!("event_time '{}' is shorter than YYYY-MM-DD", raw))?;
        let date = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
            .map_err(|e| format!("event_time '{}' has no valid date prefix: {}", raw, e))?;
        Ok(Self {
            raw: raw.to_string(),
            date,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EventTime::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerEvent {
    pub verb: Verb,
    pub key: String,
    pub event_time: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adr_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adr_state: Option<String>,
}

/// `total_amount` stays in wire form here; the engine parses it so that a
/// malformed amount is reported as a rejection of this one event.
///
/// NEW carries every field. UPDATE may omit `customer_id` and `total_amount`,
/// in which case the stored values are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OrderFields")]
pub struct OrderEvent {
    pub verb: Verb,
    pub key: String,
    pub event_time: EventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct OrderFields {
    verb: Verb,
    key: String,
    event_time: EventTime,
    #[serde(default)]
    customer_id: Option<String>,
    #[serde(default)]
    total_amount: Option<String>,
}

impl TryFrom<OrderFields> for OrderEvent {
    type Error = String;

    fn try_from(fields: OrderFields) -> Result<Self, Self::Error> {
        if fields.verb == Verb::New {
            if fields.customer_id.is_none() {
                return Err("missing field `customer_id`".to_string());
            }
            if fields.total_amount.is_none() {
                return Err("missing field `total_amount`".to_string());
            }
        }
        Ok(OrderEvent {
            verb: fields.verb,
            key: fields.key,
            event_time: fields.event_time,
            customer_id: fields.customer_id,
            total_amount: fields.total_amount,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageEvent {
    /// Accepted for wire compatibility, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<JsonValue>,
    pub key: String,
    pub event_time: EventTime,
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteVisitEvent {
    /// Accepted for wire compatibility, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<JsonValue>,
    pub key: String,
    pub event_time: EventTime,
    pub customer_id: String,
    /// Accepted on input, never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Customer(CustomerEvent),
    Order(OrderEvent),
    Image(ImageEvent),
    SiteVisit(SiteVisitEvent),
}

impl Event {
    /// Decode one wire object. The error text names the offending field.
    pub fn from_value(value: &JsonValue) -> Result<Self, String> {
        Event::deserialize(value).map_err(|e| e.to_string())
    }

    /// Wire form of the event, as written to rejection logs.
    pub fn to_value(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    pub fn key(&self) -> &str {
        match self {
            Event::Customer(e) => &e.key,
            Event::Order(e) => &e.key,
            Event::Image(e) => &e.key,
            Event::SiteVisit(e) => &e.key,
        }
    }

    /// `None` for entity types that only support insertion.
    pub fn verb(&self) -> Option<Verb> {
        match self {
            Event::Customer(e) => Some(e.verb),
            Event::Order(e) => Some(e.verb),
            Event::Image(_) | Event::SiteVisit(_) => None,
        }
    }
}

/// Parse a currency-suffixed amount such as `"199.99 USD"`.
pub fn parse_amount(raw: &str) -> Result<f64, String> {
    let cut = raw
        .char_indices()
        .rev()
        .nth(AMOUNT_SUFFIX_CHARS - 1)
        .map(|(idx, _)| idx)
        .ok_or_else(|| format!("total_amount '{}' is too short to carry a unit", raw))?;
    let numeric = raw[..cut].trim();
    let amount: f64 = numeric
        .parse()
        .map_err(|_| format!("total_amount '{}' has no numeric value", raw))?;
    if !amount.is_finite() {
        return Err(format!("total_amount '{}' is not a finite number", raw));
    }
    Ok(amount)
}
