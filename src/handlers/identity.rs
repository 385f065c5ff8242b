//! Identifier policy
//!
//! Import identifiers, primary keys held in state, and the data-source
//! identifier dispatch.

use crate::catalog::{EntityDef, Lookup, LookupKey};
use crate::client::KeyKind;
use crate::client::Endpoint;
use crate::domain::ports::CallContext;
use crate::domain::value::Value;
use crate::error::{AttributePath, Error, Result};
use serde_json::Value as Json;

// =============================================================================
// Import
// =============================================================================

/// Parse an import identifier into the value of the id attribute.
///
/// Integer keys must parse as a 64-bit integer; UUID keys are taken verbatim.
pub fn parse_import_id(key: KeyKind, id_attribute: &str, raw: &str) -> Result<Value> {
    let raw = raw.trim();
    match key {
        KeyKind::Int => raw.parse::<i64>().map(Value::Int).map_err(|e| {
            Error::invalid_value(
                AttributePath::attr(id_attribute),
                format!("Could not parse import ID {:?} as an integer: {}", raw, e),
            )
        }),
        KeyKind::Uuid if raw.is_empty() => Err(Error::invalid_value(
            AttributePath::attr(id_attribute),
            "Import ID cannot be empty",
        )),
        KeyKind::Uuid => Ok(Value::from(raw)),
    }
}

/// State holding only the primary key, ready for a Read
pub fn import_state(def: &EntityDef, raw: &str) -> Result<Value> {
    let id = parse_import_id(def.key, def.id_attribute, raw)?;
    let mut state = def.block.null_object();
    state.set(def.id_attribute, id);
    Ok(state)
}

// =============================================================================
// Primary Keys
// =============================================================================

/// Primary key of a state or plan, as it appears in the item path
pub fn record_id(def: &EntityDef, value: &Value) -> Result<String> {
    match value.get(def.id_attribute) {
        Value::Int(id) => Ok(id.to_string()),
        Value::String(id) if !id.is_empty() => Ok(id.clone()),
        other => Err(Error::invalid_value(
            AttributePath::attr(def.id_attribute),
            format!("{} has no known {} (got {})", def.kind, def.id_attribute, other.type_name()),
        )),
    }
}

/// Fetch a record by its primary key
pub async fn get_by_key(endpoint: &Endpoint<'_>, ctx: &CallContext, key: KeyKind, id: &str) -> Result<Json> {
    match key {
        KeyKind::Int => {
            let id = id.parse::<i64>().map_err(|e| {
                Error::Internal(format!("{} id {:?} is not an integer: {}", endpoint.kind(), id, e))
            })?;
            endpoint.get_by_id(ctx, id).await
        }
        KeyKind::Uuid => endpoint.get_by_uuid(ctx, id).await,
    }
}

// =============================================================================
// Data-source Lookup
// =============================================================================

/// How a data source fetches its record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRequest {
    /// Primary key lookup
    Key(String),
    /// List filter that must match exactly one record
    Query(Vec<(&'static str, String)>),
}

/// Pick the lookup from the supplied identifiers.
///
/// `OneOf` dispatches on the first supplied identifier in declaration order
/// (id first, then the unique fields, then name). `AllOf` needs every
/// identifier and matches them together.
pub fn resolve_lookup(def: &EntityDef, config: &Value) -> Result<LookupRequest> {
    let lookup = def
        .lookup
        .as_ref()
        .ok_or_else(|| Error::Internal(format!("{} is not a data source", def.kind)))?;

    match lookup {
        Lookup::OneOf(keys) => {
            for key in keys {
                let attribute = def.lookup_attribute(key);
                let value = config.get(attribute);
                if !value.is_known() {
                    continue;
                }
                let text = query_text(value, attribute)?;
                return Ok(match key {
                    LookupKey::Id => LookupRequest::Key(text),
                    LookupKey::Field { query, .. } => LookupRequest::Query(vec![(*query, text)]),
                });
            }
            let names: Vec<&str> = keys.iter().map(|k| def.lookup_attribute(k)).collect();
            Err(Error::invalid_configuration(
                format!("one of {} must be set", names.join(", ")),
                names.iter().map(|n| AttributePath::attr(n)).collect(),
            ))
        }
        Lookup::AllOf(keys) => {
            let mut query = Vec::with_capacity(keys.len());
            for key in keys {
                let attribute = def.lookup_attribute(key);
                let value = config.get(attribute);
                if !value.is_known() {
                    return Err(Error::invalid_configuration(
                        format!("{} is required", attribute),
                        vec![AttributePath::attr(attribute)],
                    ));
                }
                let text = query_text(value, attribute)?;
                match key {
                    LookupKey::Id => query.push(("id", text)),
                    LookupKey::Field { query: field, .. } => query.push((*field, text)),
                }
            }
            Ok(LookupRequest::Query(query))
        }
    }
}

fn query_text(value: &Value, attribute: &str) -> Result<String> {
    match value {
        Value::Int(i) => Ok(i.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::invalid_value(
            AttributePath::attr(attribute),
            format!("cannot look up by a {} value", other.type_name()),
        )),
    }
}
