//! Preference value representation and merge rules.
//!
//! Preference values are JSON-shaped. The merge rule is intentionally
//! shallow: when two scopes both contribute a record for the same name,
//! the higher scope replaces keys one level deep and base-only keys
//! survive. Nested records are replaced wholesale, never merged.

use serde_json::Value;

/// A preference value as contributed by a provider.
pub type PreferenceValue = Value;

/// Merge `overlay` onto `base`, returning the combined value.
///
/// If both sides are records, the result keeps every base key and replaces
/// keys that the overlay also defines with the overlay's value for that key.
/// In every other combination the overlay replaces the base outright.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use pref_model::overlay_value;
///
/// let base = json!({"a": 1, "b": 2});
/// let merged = overlay_value(Some(&base), &json!({"b": 3, "c": 4}));
/// assert_eq!(merged, json!({"a": 1, "b": 3, "c": 4}));
/// ```
pub fn overlay_value(base: Option<&Value>, overlay: &Value) -> Value {
    match (base, overlay) {
        (Some(Value::Object(base_map)), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in overlay_map {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => overlay.clone(),
    }
}

/// Walk dotted path `segments` into `value`, treating each segment as a
/// record key. Returns `None` as soon as a segment misses or the current
/// value is not a record.
pub fn value_at_path<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = current.as_object()?.get(*segment)?;
    }
    Some(current)
}
