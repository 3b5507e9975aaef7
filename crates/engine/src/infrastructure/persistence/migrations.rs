//! Load-time upgrades of saved documents.
//!
//! Each function takes the raw JSON of one storage key and returns JSON that
//! deserializes into the current types. They run before every load, so they
//! must leave current documents untouched.
//!
//! Older saves differ from the current layout in these ways:
//! - calendar: date fields and custom events/logs sit at the top level, log
//!   timestamps are epoch milliseconds, `activeSeasons`/`yearWeather`/
//!   `yearMoonEffects` may be missing, and moon signs may use a per-day
//!   layout without the three phase slots
//! - encounter and scratchpad: ids are epoch-millisecond strings and log
//!   timestamps are epoch milliseconds

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use vault_domain::{CalendarDate, MoonSign, SpecialSeason, CALENDAR_SCHEMA_VERSION};

const DATE_FIELDS: [&str; 4] = ["year", "month", "day", "hour"];
const PHASE_SLOTS: [&str; 3] = ["waxing", "full", "waning"];

// =============================================================================
// Calendar
// =============================================================================

pub fn migrate_calendar(mut value: Value) -> Value {
    let Some(doc) = value.as_object_mut() else {
        return value;
    };

    let version = doc
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    if version < 2 {
        nest_date(doc);
        nest_events(doc);
    }

    ensure_object(doc, "yearWeather");
    ensure_object(doc, "yearMoonEffects");
    retain_known_seasons(doc);
    drop_incomplete_moon_years(doc);

    if let Some(events) = doc.get_mut("events").and_then(Value::as_object_mut) {
        if !matches!(events.get("customEvents"), Some(Value::Array(_))) {
            events.insert("customEvents".into(), Value::Array(Vec::new()));
        }
        ensure_object(events, "logs");
        if let Some(logs) = events.get_mut("logs").and_then(Value::as_object_mut) {
            for entries in logs.values_mut().filter_map(Value::as_array_mut) {
                entries.iter_mut().for_each(millis_timestamp_to_rfc3339);
            }
        }
    }

    doc.insert("schemaVersion".into(), Value::from(CALENDAR_SCHEMA_VERSION));
    value
}

fn nest_date(doc: &mut Map<String, Value>) {
    if doc.get("date").is_some_and(Value::is_object) {
        return;
    }
    let start = CalendarDate::campaign_start();
    let defaults = [
        i64::from(start.year),
        i64::from(start.month),
        i64::from(start.day),
        i64::from(start.hour),
    ];

    let mut date = Map::new();
    for (field, default) in DATE_FIELDS.into_iter().zip(defaults) {
        let v = doc
            .remove(field)
            .and_then(|v| v.as_i64())
            .unwrap_or(default);
        date.insert(field.into(), Value::from(v));
    }
    doc.insert("date".into(), Value::Object(date));
}

fn nest_events(doc: &mut Map<String, Value>) {
    if doc.get("events").is_some_and(Value::is_object) {
        return;
    }
    let mut events = Map::new();
    events.insert(
        "customEvents".into(),
        doc.remove("customEvents").unwrap_or(Value::Array(Vec::new())),
    );
    events.insert(
        "logs".into(),
        doc.remove("logs").unwrap_or(Value::Object(Map::new())),
    );
    doc.insert("events".into(), Value::Object(events));
}

fn ensure_object(doc: &mut Map<String, Value>, key: &str) {
    if !doc.get(key).is_some_and(Value::is_object) {
        doc.insert(key.into(), Value::Object(Map::new()));
    }
}

fn retain_known_seasons(doc: &mut Map<String, Value>) {
    let known: Vec<Value> = doc
        .get("activeSeasons")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter(|id| id.as_str().and_then(SpecialSeason::from_id).is_some())
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    doc.insert("activeSeasons".into(), Value::Array(known));
}

/// A year is kept only if every month carries three known signs.
fn drop_incomplete_moon_years(doc: &mut Map<String, Value>) {
    let Some(years) = doc.get_mut("yearMoonEffects").and_then(Value::as_object_mut) else {
        return;
    };
    years.retain(|_, months| {
        months.as_object().is_some_and(|months| {
            !months.is_empty() && months.values().all(has_phase_slots)
        })
    });
}

fn has_phase_slots(month: &Value) -> bool {
    PHASE_SLOTS.iter().all(|slot| {
        month
            .get(slot)
            .is_some_and(|sign| serde_json::from_value::<MoonSign>(sign.clone()).is_ok())
    })
}

// =============================================================================
// Encounter and scratchpad
// =============================================================================

pub fn migrate_encounter(mut value: Value) -> Value {
    let Some(doc) = value.as_object_mut() else {
        return value;
    };
    if let Some(id) = doc.get_mut("id") {
        legacy_id_to_uuid(id);
    }
    if let Some(log) = doc.get_mut("log").and_then(Value::as_array_mut) {
        log.iter_mut().for_each(millis_timestamp_to_rfc3339);
    }
    value
}

pub fn migrate_session(mut value: Value) -> Value {
    let Some(doc) = value.as_object_mut() else {
        return value;
    };
    if let Some(id) = doc.get_mut("id") {
        legacy_id_to_uuid(id);
    }
    value
}

pub fn migrate_session_history(mut value: Value) -> Value {
    if let Some(sessions) = value.as_array_mut() {
        for session in sessions.iter_mut() {
            *session = migrate_session(std::mem::take(session));
        }
    }
    value
}

/// Numeric ids become the UUID with the same 128-bit value, so a session
/// keeps matching its history entry.
fn legacy_id_to_uuid(id: &mut Value) {
    let numeric = match id {
        Value::String(s) if Uuid::parse_str(s).is_err() => s.trim().parse::<u128>().ok(),
        Value::Number(n) => n.as_u64().map(u128::from),
        _ => return,
    };
    *id = match numeric {
        Some(n) => Value::String(Uuid::from_u128(n).to_string()),
        None => Value::Null,
    };
}

fn millis_timestamp_to_rfc3339(entry: &mut Value) {
    let Some(timestamp) = entry.get_mut("timestamp") else {
        return;
    };
    if let Some(millis) = timestamp.as_i64() {
        if let Some(at) = DateTime::<Utc>::from_timestamp_millis(millis) {
            *timestamp = Value::String(at.to_rfc3339());
        }
    }
}
