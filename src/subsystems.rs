//! Subsystem registration: centralizes the schema descriptions.
//!
//! Adding a new subsystem: append one entry to `SUBSYSTEMS`.

use crate::plugins::{ingest, ltv};

pub(crate) struct Subsystem {
    pub name: &'static str,
    pub schema: fn() -> serde_json::Value,
}

pub(crate) const SUBSYSTEMS: &[Subsystem] = &[
    Subsystem { name: "ingest", schema: ingest::schema },
    Subsystem { name: "ltv", schema: ltv::schema },
];

/// Schema of every registered subsystem, keyed by name.
pub(crate) fn schema_document() -> serde_json::Value {
    let mut subsystems = serde_json::Map::new();
    for sub in SUBSYSTEMS {
        subsystems.insert(sub.name.to_string(), (sub.schema)());
    }
    serde_json::json!({
        "name": "ltv",
        "version": env!("CARGO_PKG_VERSION"),
        "subsystems": subsystems,
    })
}
