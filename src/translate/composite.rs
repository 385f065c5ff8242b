//! Schema-driven object translation
//!
//! Encodes a host object into a wire record by walking the block in
//! declaration order, and decodes a wire record back into a host object.
//! Per-attribute behaviour comes entirely from the [`Attribute`] descriptor.

use super::primitives::{
    enum_from_wire, enum_to_wire, json_type, list_from_wire, list_to_wire, scalar_from_wire, scalar_to_wire,
    set_from_wire, set_to_wire, string_map_from_wire,
};
use crate::domain::value::Value;
use crate::error::{AttributePath, Error, Result};
use crate::schema::{AttrType, Attribute, Block, Direction, Role};
use serde_json::{Map as JsonMap, Value as Json};
use std::collections::BTreeMap;

fn child(path: &AttributePath, name: &str) -> AttributePath {
    if path.is_root() {
        AttributePath::attr(name)
    } else {
        path.at(name)
    }
}

// =============================================================================
// Encode
// =============================================================================

/// Encode a host object into a wire record
pub fn encode_block(block: &Block, value: &Value, path: &AttributePath) -> Result<JsonMap<String, Json>> {
    let mut record = JsonMap::new();

    for (name, attr) in block.iter() {
        // Computed-only attributes are the server's; the host never writes them.
        if attr.role == Role::Computed
            || matches!(attr.wire.direction, Direction::ReadOnly | Direction::Local)
        {
            continue;
        }
        let attr_path = child(path, name);
        let v = value.get(name);

        if v.is_unknown() {
            if attr.role.is_computed() {
                // Left for the server to fill in.
                continue;
            }
            return Err(Error::invalid_value(
                attr_path,
                "value is unknown; unknown values must be resolved before they are sent to Zentral",
            ));
        }
        if v.is_null() && attr.role == Role::Required {
            return Err(Error::invalid_value(attr_path, "required attribute is null"));
        }

        let json = encode_attribute(attr, v, &attr_path)?;
        record.insert(attr.wire_field(name).to_string(), json);
    }

    Ok(record)
}

/// Encode a single attribute value
pub fn encode_attribute(attr: &Attribute, value: &Value, path: &AttributePath) -> Result<Json> {
    if let Some(map) = attr.wire.enum_map {
        return enum_to_wire(map, value, path);
    }
    encode_typed(&attr.ty, value, path)
}

fn encode_typed(ty: &AttrType, value: &Value, path: &AttributePath) -> Result<Json> {
    match ty {
        AttrType::Bool | AttrType::Int | AttrType::String => scalar_to_wire(ty, value, path),
        AttrType::Set(element) => set_to_wire(value, path, |v, p| encode_typed(element, v, p)),
        AttrType::List(element) => list_to_wire(value, path, |v, p| encode_typed(element, v, p)),
        AttrType::Map(element) => match value {
            Value::Null => Ok(Json::Null),
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), encode_typed(element, v, &path.key(k))?)))
                .collect::<Result<JsonMap<_, _>>>()
                .map(Json::Object),
            Value::Unknown => Err(Error::invalid_value(path.clone(), "unknown map reached the encoder")),
            other => Err(Error::invalid_value(
                path.clone(),
                format!("expected map, got {}", other.type_name()),
            )),
        },
        AttrType::Object(block) => match value {
            Value::Null => Ok(Json::Null),
            Value::Object(_) => encode_block(block, value, path).map(Json::Object),
            Value::Unknown => Err(Error::invalid_value(path.clone(), "unknown object reached the encoder")),
            other => Err(Error::invalid_value(
                path.clone(),
                format!("expected object, got {}", other.type_name()),
            )),
        },
    }
}

// =============================================================================
// Decode
// =============================================================================

/// Decode a wire record into a host object.
///
/// `prior` supplies the values of write-only and local attributes, which
/// the server never returns.
pub fn decode_block(block: &Block, json: &Json, prior: &Value, path: &AttributePath) -> Result<Value> {
    let record = match json {
        Json::Object(record) => record,
        Json::Null => return Ok(Value::Null),
        other => {
            return Err(Error::invalid_value(
                path.clone(),
                format!("expected object, got {}", json_type(other)),
            ))
        }
    };

    let mut attrs = BTreeMap::new();
    for (name, attr) in block.iter() {
        let attr_path = child(path, name);
        let prior_value = prior.get(name);

        let value = match attr.wire.direction {
            Direction::WriteOnly | Direction::Local => match prior_value {
                // Unknown never lands in state.
                Value::Unknown => Value::Null,
                v => v.clone(),
            },
            Direction::Both | Direction::ReadOnly => {
                let wire = record.get(attr.wire_field(name)).unwrap_or(&Json::Null);
                decode_attribute(attr, wire, prior_value, &attr_path)?
            }
        };
        attrs.insert(name.to_string(), value);
    }

    Ok(Value::Object(attrs))
}

/// Decode a single attribute value
pub fn decode_attribute(attr: &Attribute, json: &Json, prior: &Value, path: &AttributePath) -> Result<Value> {
    if let Some(map) = attr.wire.enum_map {
        return enum_from_wire(map, json, path);
    }
    decode_typed(&attr.ty, json, prior, attr.wire.nullable_empty, path)
}

fn decode_typed(ty: &AttrType, json: &Json, prior: &Value, nullable_empty: bool, path: &AttributePath) -> Result<Value> {
    match ty {
        AttrType::Bool | AttrType::Int | AttrType::String => scalar_from_wire(ty, json, path),
        AttrType::Set(element) => set_from_wire(json, path, nullable_empty, |j, p| {
            decode_typed(element, j, &Value::Null, false, p)
        }),
        AttrType::List(element) => {
            let prior_items = match prior {
                Value::List(items) => items.as_slice(),
                _ => &[],
            };
            let mut index = 0;
            list_from_wire(json, path, nullable_empty, |j, p| {
                let prior_item = prior_items.get(index).unwrap_or(&Value::Null);
                index += 1;
                decode_typed(element, j, prior_item, false, p)
            })
        }
        AttrType::Map(element) if **element == AttrType::String => string_map_from_wire(json, path),
        AttrType::Map(element) => match json {
            Json::Null => Ok(Value::Null),
            Json::Object(entries) => entries
                .iter()
                .map(|(k, v)| {
                    let prior_entry = match prior {
                        Value::Map(m) => m.get(k).unwrap_or(&Value::Null),
                        _ => &Value::Null,
                    };
                    Ok((k.clone(), decode_typed(element, v, prior_entry, false, &path.key(k))?))
                })
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Value::Map),
            other => Err(Error::invalid_value(
                path.clone(),
                format!("expected object, got {}", json_type(other)),
            )),
        },
        AttrType::Object(block) => decode_block(block, json, prior, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{int_id, version, Attribute, EnumMap};
    use assert_matches::assert_matches;
    use serde_json::json;

    static CLIENT_MODES: EnumMap = EnumMap {
        name: "client mode",
        pairs: &[("MONITOR", 1), ("LOCKDOWN", 2)],
    };

    fn block() -> Block {
        let header = Block::new()
            .attr("name", Attribute::required(AttrType::String))
            .attr("value", Attribute::required(AttrType::String).sensitive());
        Block::new()
            .attr("id", int_id())
            .attr("name", Attribute::required(AttrType::String))
            .attr("client_mode", Attribute::optional(AttrType::String).default("MONITOR").enum_map(&CLIENT_MODES))
            .attr("quota", Attribute::optional(AttrType::Int))
            .attr("serial_numbers", Attribute::optional(AttrType::string_set()).default(Value::empty_set()))
            .attr("event_types", Attribute::optional(AttrType::string_set()).nullable_empty())
            .attr("headers", Attribute::optional(AttrType::set_of(header.into_type())).default(Value::empty_set()))
            .attr("html_file", Attribute::optional(AttrType::String).local())
            .attr("password", Attribute::optional(AttrType::String).sensitive().write_only())
            .attr("pkg_name", Attribute::required(AttrType::String).wire_name("pkg_info_name"))
            .attr("version", version())
    }

    fn host_value() -> Value {
        Value::object([
            ("id", Value::Unknown),
            ("name", Value::from("default")),
            ("client_mode", Value::from("LOCKDOWN")),
            ("quota", Value::Null),
            ("serial_numbers", Value::string_set(["ABC", "DEF"])),
            ("event_types", Value::Null),
            (
                "headers",
                Value::Set(
                    [Value::object([("name", Value::from("X-Token")), ("value", Value::from("s"))])]
                        .into_iter()
                        .collect(),
                ),
            ),
            ("html_file", Value::from("/tmp/view.html")),
            ("password", Value::from("p4ss")),
            ("pkg_name", Value::from("munkitools")),
            ("version", Value::Unknown),
        ])
    }

    #[test]
    fn test_encode_block() {
        let record = encode_block(&block(), &host_value(), &AttributePath::root()).unwrap();
        assert_eq!(
            Json::Object(record),
            json!({
                "name": "default",
                "client_mode": 2,
                "quota": null,
                "serial_numbers": ["ABC", "DEF"],
                "event_types": [],
                "headers": [{"name": "X-Token", "value": "s"}],
                "password": "p4ss",
                "pkg_info_name": "munkitools",
            })
        );
    }

    #[test]
    fn test_encode_rejects_unknown_and_null_required() {
        let mut value = host_value();
        value.set("name", Value::Unknown);
        assert_matches!(
            encode_block(&block(), &value, &AttributePath::root()),
            Err(Error::InvalidAttributeValue { ref path, .. }) if path.to_string() == "name"
        );

        let mut value = host_value();
        value.set("pkg_name", Value::Null);
        assert!(encode_block(&block(), &value, &AttributePath::root()).is_err());
    }

    #[test]
    fn test_decode_block_keeps_local_and_write_only_from_prior() {
        let wire = json!({
            "id": 7,
            "name": "default",
            "client_mode": 2,
            "quota": null,
            "serial_numbers": ["DEF", "ABC"],
            "event_types": [],
            "headers": [{"name": "X-Token", "value": "s"}],
            "pkg_info_name": "munkitools",
            "version": 1,
            "created_at": "2024-01-01T00:00:00",
        });
        let decoded = decode_block(&block(), &wire, &host_value(), &AttributePath::root()).unwrap();

        assert_eq!(decoded.get_int("id"), Some(7));
        assert_eq!(decoded.get_str("client_mode"), Some("LOCKDOWN"));
        assert_eq!(decoded.get("serial_numbers"), &Value::string_set(["ABC", "DEF"]));
        assert!(decoded.get("event_types").is_null());
        assert_eq!(decoded.get_str("html_file"), Some("/tmp/view.html"));
        assert_eq!(decoded.get_str("password"), Some("p4ss"));
        assert_eq!(decoded.get_str("pkg_name"), Some("munkitools"));
        assert_eq!(decoded.get_int("version"), Some(1));
    }

    #[test]
    fn test_round_trip_matches_plan() {
        let mut plan = host_value();
        plan.set("id", Value::Int(7));
        plan.set("version", Value::Int(1));
        plan.set("event_types", Value::string_set(["munki_event"]));

        let mut record = encode_block(&block(), &plan, &AttributePath::root()).unwrap();
        record.insert("id".into(), json!(7));
        record.insert("version".into(), json!(1));
        record.remove("password");

        let decoded = decode_block(&block(), &Json::Object(record), &plan, &AttributePath::root()).unwrap();
        assert_eq!(decoded, plan);
    }

    #[test]
    fn test_decode_unknown_enum_code() {
        let wire = json!({"name": "x", "client_mode": 9, "pkg_info_name": "p"});
        assert_matches!(
            decode_block(&block(), &wire, &Value::Null, &AttributePath::root()),
            Err(Error::InvalidAttributeValue { .. })
        );
    }
}
