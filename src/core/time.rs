//! Timestamps, identifiers and the JSON envelope shared by command output and
//! journal lines.

use chrono::Utc;
use serde_json::Value as JsonValue;
use ulid::Ulid;

pub const ENVELOPE_VERSION: &str = "1.0.0";

/// Unix-epoch seconds with a `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    format!("{}Z", Utc::now().timestamp())
}

/// Wall-clock time of day for human-facing summaries (`HH:MM:SS`, UTC).
pub fn now_clock() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Wrap `extra` in the standard envelope. Keys in `extra` win over the
/// envelope's own keys except `cmd` and `status`.
pub fn command_envelope(cmd: &str, status: &str, extra: JsonValue) -> JsonValue {
    let mut base = serde_json::json!({
        "envelope_version": ENVELOPE_VERSION,
        "ts": now_epoch_z(),
        "event_id": new_event_id(),
    });
    if let (Some(base_obj), Some(extra_obj)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            base_obj.insert(k.clone(), v.clone());
        }
    }
    if let Some(base_obj) = base.as_object_mut() {
        base_obj.insert("cmd".to_string(), JsonValue::from(cmd));
        base_obj.insert("status".to_string(), JsonValue::from(status));
    }
    base
}
