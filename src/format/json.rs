//! JSON translation files.
//!
//! Nested objects are flattened into dot-separated keys on read. Writes
//! produce a flat object, so a nested file becomes flat after its first
//! flush but keeps the same keys.

use std::collections::BTreeMap;

use serde_json::{
    Map,
    Value,
};

use super::FormatError;

/// Separator joining nested object keys.
pub const KEY_SEPARATOR: &str = ".";

pub fn parse(content: &str) -> Result<BTreeMap<String, String>, FormatError> {
    let json: Value = serde_json::from_str(content)?;
    if !json.is_object() {
        return Err(FormatError::NotAnObject);
    }
    Ok(flatten_json(&json, KEY_SEPARATOR, None))
}

pub fn render(texts: &BTreeMap<&str, &str>) -> Result<String, FormatError> {
    let object: Map<String, Value> = texts
        .iter()
        .map(|(key, text)| ((*key).to_string(), Value::String((*text).to_string())))
        .collect();

    let mut rendered = serde_json::to_string_pretty(&Value::Object(object))?;
    rendered.push('\n');
    Ok(rendered)
}

/// Flatten nested JSON object into dot-separated key map.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use translation_stack::format::json::flatten_json;
///
/// let json = json!({
///     "common": {
///         "hello": "Hello",
///         "goodbye": "Goodbye"
///     }
/// });
///
/// let flattened = flatten_json(&json, ".", None);
/// assert_eq!(flattened.get("common.hello"), Some(&"Hello".to_string()));
/// assert_eq!(flattened.get("common.goodbye"), Some(&"Goodbye".to_string()));
/// ```
#[must_use]
pub fn flatten_json(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    flatten_json_value(json, separator, prefix, &mut result);
    result
}

fn flatten_json_value(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut BTreeMap<String, String>,
) {
    match json {
        Value::Object(map) => {
            for (key, value) in map {
                let full_key =
                    prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        Value::Array(arr) => {
            for (index, value) in arr.iter().enumerate() {
                let full_key =
                    prefix.map_or_else(|| format!("[{index}]"), |p| format!("{p}[{index}]"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        // A null text is an undefined text
        Value::Null => {}
        Value::String(s) => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), s.clone());
            }
        }
        _ => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), json.to_string());
            }
        }
    }
}
