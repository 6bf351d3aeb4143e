//! Record normalizer module
//!
//! Converts loosely-typed stream records into the fixed-shape
//! CanonicalEvent. Total: every failure mode degrades to a sentinel value
//! (`-1` for the event ID, `""` for text fields), never an error.

use crate::models::{CanonicalEvent, RawRecord, EVENT_ID_SENTINEL};
use serde_json::Value;

/// Normalize a raw record into a CanonicalEvent.
///
/// Pure function of its input; no side effects.
pub fn normalize(raw: &RawRecord) -> CanonicalEvent {
    CanonicalEvent {
        event_id: extract_event_id(raw.get("EventID")),
        utc_time: extract_text(raw.get("UtcTime")),
        image: extract_text(raw.get("Image")),
        process_name: extract_text(raw.get("ProcessName")),
        command_line: extract_text(raw.get("CommandLine")),
    }
}

/// Integer values pass through; strings of only decimal digits are parsed.
/// Everything else (floats, null, missing, wrong types) is the sentinel.
fn extract_event_id(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(EVENT_ID_SENTINEL),
        Some(Value::String(s)) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().unwrap_or(EVENT_ID_SENTINEL)
        }
        _ => EVENT_ID_SENTINEL,
    }
}

/// Coerce a value to text. Null, missing keys, and nested structures all
/// collapse to the empty string.
fn extract_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_integer_event_id_passes_through() {
        let event = normalize(&raw(json!({"EventID": 4624})));
        assert_eq!(event.event_id, 4624);
    }

    #[test]
    fn test_digit_string_event_id_is_parsed() {
        let event = normalize(&raw(json!({"EventID": "4688"})));
        assert_eq!(event.event_id, 4688);
    }

    #[test]
    fn test_non_digit_string_event_id_is_sentinel() {
        let event = normalize(&raw(json!({"EventID": "4a24"})));
        assert_eq!(event.event_id, EVENT_ID_SENTINEL);
    }

    #[test]
    fn test_float_event_id_is_sentinel() {
        let event = normalize(&raw(json!({"EventID": 4624.5})));
        assert_eq!(event.event_id, EVENT_ID_SENTINEL);
    }

    #[test]
    fn test_null_event_id_is_sentinel() {
        let event = normalize(&raw(json!({"EventID": null})));
        assert_eq!(event.event_id, EVENT_ID_SENTINEL);
    }

    #[test]
    fn test_empty_record_yields_all_sentinels() {
        let event = normalize(&RawRecord::new());
        assert_eq!(event.event_id, EVENT_ID_SENTINEL);
        assert_eq!(event.utc_time, "");
        assert_eq!(event.image, "");
        assert_eq!(event.process_name, "");
        assert_eq!(event.command_line, "");
    }

    #[test]
    fn test_text_fields_pass_through() {
        let event = normalize(&raw(json!({
            "EventID": 1,
            "UtcTime": "2025-01-01 00:00:00",
            "Image": "C:\\Windows\\System32\\cmd.exe",
            "ProcessName": "cmd.exe",
            "CommandLine": "cmd.exe /c dir"
        })));
        assert_eq!(event.utc_time, "2025-01-01 00:00:00");
        assert_eq!(event.image, "C:\\Windows\\System32\\cmd.exe");
        assert_eq!(event.process_name, "cmd.exe");
        assert_eq!(event.command_line, "cmd.exe /c dir");
    }

    #[test]
    fn test_numeric_text_field_is_coerced() {
        let event = normalize(&raw(json!({"ProcessName": 42})));
        assert_eq!(event.process_name, "42");
    }

    #[test]
    fn test_bool_text_field_is_coerced() {
        let event = normalize(&raw(json!({"Image": true})));
        assert_eq!(event.image, "true");
    }

    #[test]
    fn test_null_text_field_is_empty() {
        let event = normalize(&raw(json!({"CommandLine": null})));
        assert_eq!(event.command_line, "");
    }

    #[test]
    fn test_nested_structure_collapses_to_empty() {
        let event = normalize(&raw(json!({
            "CommandLine": {"nested": "value"},
            "Image": ["a", "b"]
        })));
        assert_eq!(event.command_line, "");
        assert_eq!(event.image, "");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let event = normalize(&raw(json!({"EventID": 3, "SourceIp": "10.0.0.1"})));
        assert_eq!(event.event_id, 3);
        assert_eq!(event.image, "");
    }

    #[test]
    fn test_negative_string_is_sentinel() {
        // "-5" contains a non-digit byte, so it does not parse
        let event = normalize(&raw(json!({"EventID": "-5"})));
        assert_eq!(event.event_id, EVENT_ID_SENTINEL);
    }
}
