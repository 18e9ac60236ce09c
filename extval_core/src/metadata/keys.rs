//! Abstract configuration keys produced by metadata transformers

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

pub const MIN_LENGTH: &str = "min_length";
pub const MAX_LENGTH: &str = "max_length";
pub const RANGE_MIN: &str = "range_min";
pub const RANGE_MAX: &str = "range_max";
/// Strong required: the component becomes required.
pub const REQUIRED: &str = "required";
/// Required unless the page author decided otherwise.
pub const WEAK_REQUIRED: &str = "weak_required";
/// Regular expressions, as an array.
pub const PATTERN: &str = "pattern";
/// Names of validators run by the host framework, as an array.
pub const CUSTOM: &str = "custom";
pub const EMAIL: &str = "email";

/// Framework-agnostic configuration derived from constraints.
pub type MetaData = BTreeMap<String, JsonValue>;

/// Folds `incoming` into `target` so that the combined configuration is the
/// strictest of both: lower bounds take the maximum, upper bounds the minimum,
/// flags are or'ed and list keys are concatenated without duplicates. Other
/// keys are overwritten.
pub fn merge_meta_data(target: &mut MetaData, incoming: MetaData) {
    for (key, value) in incoming {
        let merged = match (key.as_str(), target.remove(&key)) {
            (_, None) => value,
            (MIN_LENGTH | RANGE_MIN, Some(existing)) => stricter(existing, value, |a, b| a >= b),
            (MAX_LENGTH | RANGE_MAX, Some(existing)) => stricter(existing, value, |a, b| a <= b),
            (REQUIRED | WEAK_REQUIRED | EMAIL, Some(existing)) => {
                JsonValue::Bool(existing.as_bool().unwrap_or(false) || value.as_bool().unwrap_or(false))
            }
            (PATTERN | CUSTOM, Some(existing)) => union(existing, value),
            (_, Some(_)) => value,
        };
        target.insert(key, merged);
    }
}

fn stricter(existing: JsonValue, incoming: JsonValue, keep_existing: impl Fn(f64, f64) -> bool) -> JsonValue {
    match (existing.as_f64(), incoming.as_f64()) {
        (Some(a), Some(b)) if keep_existing(a, b) => existing,
        (Some(_), Some(_)) => incoming,
        (Some(_), None) => existing,
        _ => incoming,
    }
}

fn union(existing: JsonValue, incoming: JsonValue) -> JsonValue {
    let mut items = into_list(existing);
    for item in into_list(incoming) {
        if !items.contains(&item) {
            items.push(item);
        }
    }
    JsonValue::Array(items)
}

fn into_list(value: JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Array(items) => items,
        JsonValue::Null => Vec::new(),
        other => vec![other],
    }
}

/// Reads a list key as strings, ignoring non-string items.
pub fn string_list(meta_data: &MetaData, key: &str) -> Vec<String> {
    match meta_data.get(key) {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(JsonValue::String(item)) => vec![item.clone()],
        _ => Vec::new(),
    }
}

pub fn flag(meta_data: &MetaData, key: &str) -> bool {
    meta_data.get(key).and_then(JsonValue::as_bool).unwrap_or(false)
}
