//! Case-insensitive JSON field matching
//!
//! Documents written by older versions of the application use `PascalCase`
//! keys (`"Id"`, `"LastUsed"`), current ones use `camelCase`. Serde matches
//! field names exactly, so keys are rewritten to their canonical spelling
//! before deserialization.
//!
//! Hand-edited documents also carry `null` where a value is expected;
//! [`null_as_default`] reads those as the field's default.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Deserialize a field, reading `null` as `T::default()`
///
/// For use with `#[serde(deserialize_with = "...")]` together with a
/// `default` on the field, so both missing and `null` values are tolerated.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Rewrite object keys that equal one of `fields` ignoring ASCII case
///
/// Applies to a top-level object, or to every object element of a top-level
/// array. Nested values are left untouched. Keys that match no field are kept
/// as they are.
pub fn canonicalize_keys(value: &mut Value, fields: &[&str]) {
    match value {
        Value::Array(items) => {
            for item in items {
                if let Value::Object(map) = item {
                    canonicalize_object(map, fields);
                }
            }
        }
        Value::Object(map) => canonicalize_object(map, fields),
        _ => {}
    }
}

fn canonicalize_object(map: &mut Map<String, Value>, fields: &[&str]) {
    let original = std::mem::take(map);
    for (key, v) in original {
        let key = fields
            .iter()
            .find(|field| field.eq_ignore_ascii_case(&key))
            .map_or(key, |field| (*field).to_string());
        map.insert(key, v);
    }
}
