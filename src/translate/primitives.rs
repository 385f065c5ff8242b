//! Primitive translation rules
//!
//! Host value ↔ wire JSON for scalars and scalar collections:
//! - optional scalars: null ↔ absent, known ↔ value, unknown never encoded
//! - sets and lists: null/unknown encode as an empty list
//! - string maps: non-string wire scalars are stringified canonically

use crate::domain::value::Value;
use crate::error::{AttributePath, Error, Result};
use crate::schema::{AttrType, EnumMap};
use serde_json::Value as Json;
use std::collections::{BTreeMap, BTreeSet};

fn unknown_reached_encoder(path: &AttributePath) -> Error {
    Error::invalid_value(
        path.clone(),
        "value is unknown; unknown values must be resolved before they are sent to Zentral",
    )
}

fn type_mismatch(path: &AttributePath, expected: &str, got: &str) -> Error {
    Error::invalid_value(path.clone(), format!("expected {}, got {}", expected, got))
}

// =============================================================================
// Optional Scalars
// =============================================================================

/// Optional integer to wire
pub fn optional_int_to_wire(value: &Value, path: &AttributePath) -> Result<Json> {
    match value {
        Value::Null => Ok(Json::Null),
        Value::Unknown => Err(unknown_reached_encoder(path)),
        Value::Int(i) => Ok(Json::from(*i)),
        other => Err(type_mismatch(path, "number", other.type_name())),
    }
}

/// Optional integer from wire
pub fn optional_int_from_wire(json: &Json, path: &AttributePath) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| type_mismatch(path, "integer", "non-integer number")),
        other => Err(type_mismatch(path, "number", json_type(other))),
    }
}

/// Optional string to wire; the empty string is a value, not absence
pub fn optional_string_to_wire(value: &Value, path: &AttributePath) -> Result<Json> {
    match value {
        Value::Null => Ok(Json::Null),
        Value::Unknown => Err(unknown_reached_encoder(path)),
        Value::String(s) => Ok(Json::String(s.clone())),
        other => Err(type_mismatch(path, "string", other.type_name())),
    }
}

pub fn optional_string_from_wire(json: &Json, path: &AttributePath) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::String(s) => Ok(Value::String(s.clone())),
        other => Err(type_mismatch(path, "string", json_type(other))),
    }
}

pub fn optional_bool_to_wire(value: &Value, path: &AttributePath) -> Result<Json> {
    match value {
        Value::Null => Ok(Json::Null),
        Value::Unknown => Err(unknown_reached_encoder(path)),
        Value::Bool(b) => Ok(Json::Bool(*b)),
        other => Err(type_mismatch(path, "bool", other.type_name())),
    }
}

pub fn optional_bool_from_wire(json: &Json, path: &AttributePath) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        other => Err(type_mismatch(path, "bool", json_type(other))),
    }
}

/// Scalar of the given type to wire
pub fn scalar_to_wire(ty: &AttrType, value: &Value, path: &AttributePath) -> Result<Json> {
    match ty {
        AttrType::Bool => optional_bool_to_wire(value, path),
        AttrType::Int => optional_int_to_wire(value, path),
        AttrType::String => optional_string_to_wire(value, path),
        other => Err(Error::Internal(format!(
            "{} is not a scalar type ({})",
            other.type_name(),
            path
        ))),
    }
}

/// Scalar of the given type from wire
pub fn scalar_from_wire(ty: &AttrType, json: &Json, path: &AttributePath) -> Result<Value> {
    match ty {
        AttrType::Bool => optional_bool_from_wire(json, path),
        AttrType::Int => optional_int_from_wire(json, path),
        AttrType::String => optional_string_from_wire(json, path),
        other => Err(Error::Internal(format!(
            "{} is not a scalar type ({})",
            other.type_name(),
            path
        ))),
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// Uppercase enum name to its wire integer; unknown names are rejected
pub fn enum_to_wire(map: &EnumMap, value: &Value, path: &AttributePath) -> Result<Json> {
    match value {
        Value::Null => Ok(Json::Null),
        Value::Unknown => Err(unknown_reached_encoder(path)),
        Value::String(name) => map.to_wire(name).map(Json::from).ok_or_else(|| {
            Error::invalid_value(
                path.clone(),
                format!("unknown {} {:?}, expected one of: {}", map.name, name, map.names().join(", ")),
            )
        }),
        other => Err(type_mismatch(path, "string", other.type_name())),
    }
}

/// Wire integer to its enum name; unknown remote codes are an error, never
/// silently mapped to a default
pub fn enum_from_wire(map: &EnumMap, json: &Json, path: &AttributePath) -> Result<Value> {
    match optional_int_from_wire(json, path)? {
        Value::Int(code) => map
            .from_wire(code)
            .map(Value::from)
            .ok_or_else(|| {
                Error::invalid_value(path.clone(), format!("unknown {} value {} returned by Zentral", map.name, code))
            }),
        other => Ok(other),
    }
}

// =============================================================================
// Collections
// =============================================================================

/// Set to wire list. Null and unknown sets yield an empty list.
pub fn set_to_wire<F>(value: &Value, path: &AttributePath, mut element: F) -> Result<Json>
where
    F: FnMut(&Value, &AttributePath) -> Result<Json>,
{
    match value {
        Value::Null | Value::Unknown => Ok(Json::Array(Vec::new())),
        Value::Set(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| element(item, &path.index(i)))
            .collect::<Result<Vec<_>>>()
            .map(Json::Array),
        other => Err(type_mismatch(path, "set", other.type_name())),
    }
}

/// Wire list to set. `nullable_empty` turns an empty (or absent) list into a
/// null set instead of an empty one.
pub fn set_from_wire<F>(json: &Json, path: &AttributePath, nullable_empty: bool, mut element: F) -> Result<Value>
where
    F: FnMut(&Json, &AttributePath) -> Result<Value>,
{
    let items = match json {
        Json::Null => &[][..],
        Json::Array(items) => items.as_slice(),
        other => return Err(type_mismatch(path, "list", json_type(other))),
    };
    if items.is_empty() && nullable_empty {
        return Ok(Value::Null);
    }
    let set = items
        .iter()
        .enumerate()
        .map(|(i, item)| element(item, &path.index(i)))
        .collect::<Result<BTreeSet<_>>>()?;
    Ok(Value::Set(set))
}

/// Ordered list to wire; order is preserved
pub fn list_to_wire<F>(value: &Value, path: &AttributePath, mut element: F) -> Result<Json>
where
    F: FnMut(&Value, &AttributePath) -> Result<Json>,
{
    match value {
        Value::Null | Value::Unknown => Ok(Json::Array(Vec::new())),
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| element(item, &path.index(i)))
            .collect::<Result<Vec<_>>>()
            .map(Json::Array),
        other => Err(type_mismatch(path, "list", other.type_name())),
    }
}

pub fn list_from_wire<F>(json: &Json, path: &AttributePath, nullable_empty: bool, mut element: F) -> Result<Value>
where
    F: FnMut(&Json, &AttributePath) -> Result<Value>,
{
    let items = match json {
        Json::Null => &[][..],
        Json::Array(items) => items.as_slice(),
        other => return Err(type_mismatch(path, "list", json_type(other))),
    };
    if items.is_empty() && nullable_empty {
        return Ok(Value::Null);
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| element(item, &path.index(i)))
        .collect::<Result<Vec<_>>>()
        .map(Value::List)
}

/// Map of strings to wire object
pub fn string_map_to_wire(value: &Value, path: &AttributePath) -> Result<Json> {
    match value {
        Value::Null => Ok(Json::Null),
        Value::Unknown => Err(unknown_reached_encoder(path)),
        Value::Map(entries) => entries
            .iter()
            .map(|(k, v)| Ok((k.clone(), optional_string_to_wire(v, &path.key(k))?)))
            .collect::<Result<serde_json::Map<_, _>>>()
            .map(Json::Object),
        other => Err(type_mismatch(path, "map", other.type_name())),
    }
}

/// Wire object to map of strings, stringifying every value with
/// [`canonical_string`]
pub fn string_map_from_wire(json: &Json, path: &AttributePath) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Object(entries) => Ok(Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(canonical_string(v))))
                .collect::<BTreeMap<_, _>>(),
        )),
        other => Err(type_mismatch(path, "object", json_type(other))),
    }
}

/// Canonical stringification of a wire scalar.
///
/// Strings are taken verbatim, numbers and booleans use their JSON text,
/// null becomes the empty string, arrays and objects become compact JSON
/// with sorted keys.
pub fn canonical_string(json: &Json) -> String {
    match json {
        Json::String(s) => s.clone(),
        Json::Null => String::new(),
        Json::Bool(b) => b.to_string(),
        Json::Number(n) => n.to_string(),
        other => canonical_json(other),
    }
}

/// Compact JSON text with object keys in sorted order
pub fn canonical_json(json: &Json) -> String {
    fn sort(json: &Json) -> Json {
        match json {
            Json::Object(entries) => {
                let sorted: BTreeMap<&String, Json> = entries.iter().map(|(k, v)| (k, sort(v))).collect();
                Json::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
            }
            Json::Array(items) => Json::Array(items.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    sort(json).to_string()
}

pub fn json_type(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn path() -> AttributePath {
        AttributePath::attr("quota")
    }

    #[test]
    fn test_optional_int() {
        assert_eq!(optional_int_to_wire(&Value::Int(5), &path()).unwrap(), json!(5));
        assert_eq!(optional_int_to_wire(&Value::Null, &path()).unwrap(), Json::Null);
        assert_matches!(
            optional_int_to_wire(&Value::Unknown, &path()),
            Err(Error::InvalidAttributeValue { .. })
        );
        assert_eq!(optional_int_from_wire(&json!(5), &path()).unwrap(), Value::Int(5));
        assert_eq!(optional_int_from_wire(&Json::Null, &path()).unwrap(), Value::Null);
        assert!(optional_int_from_wire(&json!(1.5), &path()).is_err());
    }

    #[test]
    fn test_empty_string_is_not_absent() {
        assert_eq!(optional_string_to_wire(&Value::from(""), &path()).unwrap(), json!(""));
        assert_eq!(optional_string_from_wire(&json!(""), &path()).unwrap(), Value::from(""));
        assert_eq!(optional_string_from_wire(&Json::Null, &path()).unwrap(), Value::Null);
    }

    #[test]
    fn test_set_encode_null_and_unknown_as_empty() {
        let enc = |v: &Value, p: &AttributePath| optional_string_to_wire(v, p);
        assert_eq!(set_to_wire(&Value::Null, &path(), enc).unwrap(), json!([]));
        assert_eq!(set_to_wire(&Value::Unknown, &path(), enc).unwrap(), json!([]));
        assert_eq!(
            set_to_wire(&Value::string_set(["b", "a"]), &path(), enc).unwrap(),
            json!(["a", "b"])
        );
    }

    #[test]
    fn test_set_decode_nullable_empty() {
        let dec = |j: &Json, p: &AttributePath| optional_string_from_wire(j, p);
        assert_eq!(set_from_wire(&json!([]), &path(), true, dec).unwrap(), Value::Null);
        assert_eq!(set_from_wire(&json!([]), &path(), false, dec).unwrap(), Value::empty_set());
        assert_eq!(set_from_wire(&Json::Null, &path(), false, dec).unwrap(), Value::empty_set());
        assert_eq!(
            set_from_wire(&json!(["x", "y", "x"]), &path(), true, dec).unwrap(),
            Value::string_set(["x", "y"])
        );
    }

    #[test]
    fn test_list_preserves_order() {
        let enc = |v: &Value, p: &AttributePath| optional_string_to_wire(v, p);
        let dec = |j: &Json, p: &AttributePath| optional_string_from_wire(j, p);
        let value = Value::string_list(["zeta", "alpha"]);
        let wire = list_to_wire(&value, &path(), enc).unwrap();
        assert_eq!(wire, json!(["zeta", "alpha"]));
        assert_eq!(list_from_wire(&wire, &path(), false, dec).unwrap(), value);
    }

    #[test]
    fn test_string_map_stringifies_wire_scalars() {
        let wire = json!({
            "config_refresh": 120,
            "disable_tables": "curl",
            "verbose": true,
            "packs": {"b": 1, "a": [2, 3]},
            "logger_path": null,
        });
        let value = string_map_from_wire(&wire, &path()).unwrap();
        let Value::Map(entries) = value else { panic!("expected a map") };
        assert_eq!(entries["config_refresh"], Value::from("120"));
        assert_eq!(entries["disable_tables"], Value::from("curl"));
        assert_eq!(entries["verbose"], Value::from("true"));
        assert_eq!(entries["packs"], Value::from("{\"a\":[2,3],\"b\":1}"));
        assert_eq!(entries["logger_path"], Value::from(""));
    }

    static POLICIES: EnumMap = EnumMap {
        name: "rule policy",
        pairs: &[("ALLOWLIST", 1), ("BLOCKLIST", 2), ("SILENT_BLOCKLIST", 3), ("ALLOWLIST_COMPILER", 5)],
    };

    #[test]
    fn test_enum_gap_is_rejected_both_ways() {
        let p = AttributePath::attr("policy");
        assert_eq!(enum_to_wire(&POLICIES, &Value::from("ALLOWLIST_COMPILER"), &p).unwrap(), json!(5));
        assert_eq!(enum_from_wire(&POLICIES, &json!(3), &p).unwrap(), Value::from("SILENT_BLOCKLIST"));
        assert!(enum_from_wire(&POLICIES, &json!(4), &p).is_err());
        assert!(enum_to_wire(&POLICIES, &Value::from("REMOVE"), &p).is_err());
        assert_eq!(enum_from_wire(&POLICIES, &Json::Null, &p).unwrap(), Value::Null);
    }
}
