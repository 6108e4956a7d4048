//! Strategy parameter normalization.
//!
//! Client SDKs read every strategy parameter as a string. Rows carry whatever
//! JSON scalar was stored, so values are coerced once here.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// Coerces a single parameter value to its wire string.
///
/// Total: strings pass through, numbers and booleans use their JSON text,
/// null becomes the empty string, and arrays or objects are rendered as
/// compact JSON.
pub fn parameter_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => String::new(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.to_string(),
    }
}

/// Normalizes a raw parameter map, keeping the original key order.
/// A missing map yields an empty one.
pub fn normalize_parameters(
    parameters: Option<&IndexMap<String, JsonValue>>,
) -> IndexMap<String, String> {
    parameters
        .map(|params| {
            params
                .iter()
                .map(|(key, value)| (key.clone(), parameter_to_string(value)))
                .collect()
        })
        .unwrap_or_default()
}
