//! JSON shapes of the plugin endpoint
//!
//! Values travel as plain JSON except unknowns, which use the marker
//! `{"$unknown": true}`. Incoming JSON is shaped back into sets, lists,
//! maps and objects with the schema.

use crate::domain::value::Value;
use crate::error::{AttributePath, Error, Result};
use crate::schema::{AttrType, Attribute, Block, Role, Schema};
use serde_json::{json, Map as JsonMap, Value as Json};

pub const UNKNOWN_MARKER: &str = "$unknown";

// =============================================================================
// Values
// =============================================================================

/// Host value to JSON
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Unknown => unknown_marker(),
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::String(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Set(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Map(entries) | Value::Object(entries) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
    }
}

fn unknown_marker() -> Json {
    let mut marker = JsonMap::new();
    marker.insert(UNKNOWN_MARKER.to_string(), Json::Bool(true));
    Json::Object(marker)
}

fn is_unknown_marker(json: &Json) -> bool {
    match json {
        Json::Object(o) => o.len() == 1 && o.get(UNKNOWN_MARKER) == Some(&Json::Bool(true)),
        _ => false,
    }
}

/// JSON object to host value. Missing attributes are null; attributes the
/// block does not declare are rejected.
pub fn object_from_json(block: &Block, json: &Json, path: &AttributePath) -> Result<Value> {
    if is_unknown_marker(json) {
        return Ok(Value::Unknown);
    }
    let record = match json {
        Json::Null => return Ok(Value::Null),
        Json::Object(record) => record,
        other => return Err(shape_error(path, "object", other)),
    };
    if let Some(name) = record.keys().find(|k| block.get(k).is_none()) {
        return Err(Error::invalid_value(
            child(path, name),
            format!("An argument named \"{}\" is not expected here.", name),
        ));
    }

    let mut object = block.null_object();
    for (name, attr) in block.iter() {
        if let Some(value) = record.get(name) {
            object.set(name, value_from_json(&attr.ty, value, &child(path, name))?);
        }
    }
    Ok(object)
}

fn value_from_json(ty: &AttrType, json: &Json, path: &AttributePath) -> Result<Value> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    if is_unknown_marker(json) {
        return Ok(Value::Unknown);
    }
    match (ty, json) {
        (AttrType::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (AttrType::Int, Json::Number(n)) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| Error::invalid_value(path.clone(), format!("{} is not a 64-bit integer", n))),
        (AttrType::String, Json::String(s)) => Ok(Value::String(s.clone())),
        (AttrType::List(element), Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| value_from_json(element, item, &path.index(i)))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        (AttrType::Set(element), Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| value_from_json(element, item, &path.index(i)))
            .collect::<Result<_>>()
            .map(Value::Set),
        (AttrType::Map(element), Json::Object(entries)) => entries
            .iter()
            .map(|(k, v)| Ok((k.clone(), value_from_json(element, v, &path.key(k))?)))
            .collect::<Result<_>>()
            .map(Value::Map),
        (AttrType::Object(block), _) => object_from_json(block, json, path),
        (ty, other) => Err(shape_error(path, ty.type_name(), other)),
    }
}

fn shape_error(path: &AttributePath, expected: &str, got: &Json) -> Error {
    Error::invalid_value(
        path.clone(),
        format!("expected {}, got {}", expected, crate::translate::primitives::json_type(got)),
    )
}

fn child(path: &AttributePath, name: &str) -> AttributePath {
    if path.is_root() {
        AttributePath::attr(name)
    } else {
        path.at(name)
    }
}

// =============================================================================
// Schemas
// =============================================================================

/// Schema description published on `/v1/schema`
pub fn schema_to_json(schema: &Schema) -> Json {
    json!({
        "description": schema.description,
        "attributes": block_to_json(&schema.block),
    })
}

fn block_to_json(block: &Block) -> Json {
    Json::Object(
        block
            .iter()
            .map(|(name, attr)| (name.to_string(), attribute_to_json(attr)))
            .collect(),
    )
}

fn attribute_to_json(attr: &Attribute) -> Json {
    let mut out = JsonMap::new();
    out.insert("type".into(), type_to_json(&attr.ty));
    out.insert("description".into(), Json::from(attr.description));
    let (required, optional, computed) = match attr.role {
        Role::Required => (true, false, false),
        Role::Optional => (false, true, false),
        Role::Computed => (false, false, true),
        Role::OptionalComputed => (false, true, true),
    };
    out.insert("required".into(), Json::Bool(required));
    out.insert("optional".into(), Json::Bool(optional));
    out.insert("computed".into(), Json::Bool(computed));
    if attr.sensitive {
        out.insert("sensitive".into(), Json::Bool(true));
    }
    if let Some(default) = attr.default_value() {
        out.insert("default".into(), value_to_json(&default));
    }
    Json::Object(out)
}

fn type_to_json(ty: &AttrType) -> Json {
    match ty {
        AttrType::List(element) | AttrType::Set(element) | AttrType::Map(element) => {
            json!([ty.type_name(), type_to_json(element)])
        }
        AttrType::Object(block) => json!(["object", block_to_json(block)]),
        scalar => Json::from(scalar.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> Block {
        Block::new()
            .attr("id", crate::schema::int_id())
            .attr("name", Attribute::required(AttrType::String))
            .attr("tag_ids", Attribute::optional(AttrType::int_set()))
            .attr("options", Attribute::optional(AttrType::map_of(AttrType::String)))
    }

    #[test]
    fn test_object_from_json_shapes_collections() {
        let value = object_from_json(
            &block(),
            &json!({
                "id": {"$unknown": true},
                "name": "Default",
                "tag_ids": [3, 1, 3],
                "options": {"config_refresh": "120"},
            }),
            &AttributePath::root(),
        )
        .unwrap();
        assert!(value.get("id").is_unknown());
        assert_eq!(value.get("tag_ids"), &Value::int_set([1, 3]));
        assert_eq!(
            value.get("options"),
            &Value::Map([("config_refresh".to_string(), Value::from("120"))].into_iter().collect())
        );

        let back = value_to_json(&value);
        assert_eq!(back["id"], json!({"$unknown": true}));
        assert_eq!(back["tag_ids"], json!([1, 3]));
    }

    #[test]
    fn test_missing_attributes_are_null() {
        let value = object_from_json(&block(), &json!({"name": "Default"}), &AttributePath::root()).unwrap();
        assert_eq!(value.get("tag_ids"), &Value::Null);
        assert_eq!(value.get("id"), &Value::Null);
    }

    #[test]
    fn test_shape_errors_name_the_attribute() {
        let err = object_from_json(&block(), &json!({"name": 1}), &AttributePath::root()).unwrap_err();
        match err {
            Error::InvalidAttributeValue { path, .. } => assert_eq!(path, AttributePath::attr("name")),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(object_from_json(&block(), &json!({"nope": 1}), &AttributePath::root()).is_err());
    }

    #[test]
    fn test_schema_to_json() {
        let schema = Schema::new("Tags", block());
        let json = schema_to_json(&schema);
        assert_eq!(json["attributes"]["id"]["computed"], json!(true));
        assert_eq!(json["attributes"]["name"]["required"], json!(true));
        assert_eq!(json["attributes"]["tag_ids"]["type"], json!(["set", "number"]));
    }
}
