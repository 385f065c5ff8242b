//! Attribute validators
//!
//! Run by the host-facing validate and plan steps. Unknown values are never
//! validated; they are checked again once resolved.

use super::{AttrType, Block, Role};
use crate::domain::value::Value;
use crate::error::{AttributePath, Diagnostics, Error};
use chrono::NaiveTime;

/// Validator attached to a single attribute
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// String must be one of the listed values
    OneOf(&'static [&'static str]),
    /// Integer must be one of the listed values
    IntOneOf(&'static [i64]),
    /// Inclusive integer range
    IntBetween(i64, i64),
    IntAtLeast(i64),
    /// Minimum string length (or element count for collections)
    LengthAtLeast(usize),
    /// Applies the inner validator to every element of a list or set
    Elements(Box<Validator>),
    /// None of the sibling attributes may be set together with this one
    ConflictsWith(&'static [&'static str]),
    /// `HH:MM:SS` wall clock time
    TimeOfDay,
    /// Valid JSON text
    Json,
}

/// Constraint spanning several sibling attributes
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    ExactlyOneOf(Vec<&'static str>),
}

impl Validator {
    pub fn elements(inner: Validator) -> Self {
        Validator::Elements(Box::new(inner))
    }

    fn check(&self, value: &Value, siblings: &Value, path: &AttributePath) -> Option<Error> {
        if !value.is_known() {
            return None;
        }
        match self {
            Validator::OneOf(allowed) => {
                let s = value.as_str()?;
                if allowed.contains(&s) {
                    None
                } else {
                    Some(Error::invalid_value(
                        path.clone(),
                        format!("value must be one of: {}, got: {:?}", quoted(allowed), s),
                    ))
                }
            }
            Validator::IntOneOf(allowed) => {
                let i = value.as_int()?;
                if allowed.contains(&i) {
                    None
                } else {
                    let allowed: Vec<String> = allowed.iter().map(|i| i.to_string()).collect();
                    Some(Error::invalid_value(
                        path.clone(),
                        format!("value must be one of: [{}], got: {}", allowed.join(" "), i),
                    ))
                }
            }
            Validator::IntBetween(min, max) => {
                let i = value.as_int()?;
                if i < *min || i > *max {
                    Some(Error::invalid_value(
                        path.clone(),
                        format!("value must be between {} and {}, got: {}", min, max, i),
                    ))
                } else {
                    None
                }
            }
            Validator::IntAtLeast(min) => {
                let i = value.as_int()?;
                if i < *min {
                    Some(Error::invalid_value(
                        path.clone(),
                        format!("value must be at least {}, got: {}", min, i),
                    ))
                } else {
                    None
                }
            }
            Validator::LengthAtLeast(min) => {
                let len = match value {
                    Value::String(s) => s.chars().count(),
                    Value::List(_) | Value::Set(_) => value.elements().len(),
                    Value::Map(m) => m.len(),
                    _ => return None,
                };
                if len < *min {
                    Some(Error::invalid_value(
                        path.clone(),
                        format!("length must be at least {}, got: {}", min, len),
                    ))
                } else {
                    None
                }
            }
            Validator::Elements(inner) => value
                .elements()
                .into_iter()
                .enumerate()
                .find_map(|(i, element)| inner.check(element, siblings, &path.index(i))),
            Validator::ConflictsWith(others) => {
                let set: Vec<&str> = others
                    .iter()
                    .copied()
                    .filter(|other| siblings.get(other).is_known())
                    .collect();
                if set.is_empty() {
                    None
                } else {
                    Some(Error::invalid_configuration(
                        format!("{} cannot be specified when {} is specified", path, set.join(", ")),
                        vec![path.clone()],
                    ))
                }
            }
            Validator::TimeOfDay => {
                let s = value.as_str()?;
                match NaiveTime::parse_from_str(s, "%H:%M:%S") {
                    Ok(_) => None,
                    Err(_) => Some(Error::invalid_value(
                        path.clone(),
                        format!("value must be a HH:MM:SS time, got: {:?}", s),
                    )),
                }
            }
            Validator::Json => {
                let s = value.as_str()?;
                match serde_json::from_str::<serde_json::Value>(s) {
                    Ok(_) => None,
                    Err(e) => Some(Error::invalid_value(
                        path.clone(),
                        format!("value must be valid JSON: {}", e),
                    )),
                }
            }
        }
    }
}

fn quoted(values: &[&str]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("{:?}", v)).collect();
    format!("[{}]", quoted.join(" "))
}

fn join_names(names: &[&str], conjunction: &str) -> String {
    match names {
        [] => String::new(),
        [one] => one.to_string(),
        [a, b] => format!("{} {} {}", a, conjunction, b),
        [init @ .., last] => format!("{}, {} {}", init.join(", "), conjunction, last),
    }
}

/// Identifier cardinality: exactly one of `names` must be known.
///
/// Returns `None` while any identifier is still unknown. Messages name the
/// identifiers in alphabetical order, e.g. "id or name missing" and
/// "only one of id and name can be set".
pub fn check_exactly_one(value: &Value, names: &[&str], base: &AttributePath) -> Option<Error> {
    if names.iter().any(|n| value.get(n).is_unknown()) {
        return None;
    }
    let mut sorted: Vec<&str> = names.to_vec();
    sorted.sort_unstable();
    let paths: Vec<AttributePath> = sorted.iter().map(|n| base.at(n)).collect();

    let count = names.iter().filter(|n| value.get(n).is_known()).count();
    match count {
        1 => None,
        0 => Some(Error::invalid_configuration(
            format!("{} missing", join_names(&sorted, "or")),
            paths,
        )),
        _ => Some(Error::invalid_configuration(
            format!("only one of {} can be set", join_names(&sorted, "and")),
            paths,
        )),
    }
}

/// Validate an object value against a block, accumulating diagnostics
pub fn validate_block(block: &Block, value: &Value, path: &AttributePath, diags: &mut Diagnostics) {
    if !value.is_known() {
        return;
    }

    for (name, attr) in block.iter() {
        let attr_path = if path.is_root() {
            AttributePath::attr(name)
        } else {
            path.at(name)
        };
        let v = value.get(name);

        if v.is_null() {
            if attr.role == Role::Required {
                diags.add(Error::invalid_configuration(
                    format!("The argument \"{}\" is required, but no definition was found.", attr_path),
                    vec![attr_path],
                ));
            }
            continue;
        }
        if v.is_unknown() {
            continue;
        }
        if attr.role == Role::Computed {
            diags.add(Error::invalid_configuration(
                format!("{} is computed and cannot be set", attr_path),
                vec![attr_path],
            ));
            continue;
        }

        for validator in &attr.validators {
            if let Some(err) = validator.check(v, value, &attr_path) {
                diags.add(err);
            }
        }
        validate_nested(&attr.ty, v, &attr_path, diags);
    }

    for constraint in block.constraints() {
        match constraint {
            Constraint::ExactlyOneOf(names) => {
                if let Some(err) = check_exactly_one(value, names, path) {
                    diags.add(err);
                }
            }
        }
    }
}

fn validate_nested(ty: &AttrType, value: &Value, path: &AttributePath, diags: &mut Diagnostics) {
    match ty {
        AttrType::Object(block) => validate_block(block, value, path, diags),
        AttrType::List(element) | AttrType::Set(element) => {
            if element.is_scalar() {
                return;
            }
            for (i, item) in value.elements().into_iter().enumerate() {
                validate_nested(element, item, &path.index(i), diags);
            }
        }
        AttrType::Map(element) => {
            if let Value::Map(entries) = value {
                for (k, v) in entries {
                    validate_nested(element, v, &path.key(k), diags);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use assert_matches::assert_matches;

    fn location_identifiers(id: Value, name: Value, mdm_info_id: Value) -> Value {
        Value::object([("id", id), ("name", name), ("mdm_info_id", mdm_info_id)])
    }

    #[test]
    fn test_exactly_one_messages() {
        let names = ["id", "name", "mdm_info_id"];

        let none = location_identifiers(Value::Null, Value::Null, Value::Null);
        let err = check_exactly_one(&none, &names, &AttributePath::root()).unwrap();
        assert_eq!(err.to_string(), "id, mdm_info_id, or name missing");
        assert_eq!(err.paths().len(), 3);

        let two = location_identifiers(Value::Int(1), Value::from("Paris"), Value::Null);
        let err = check_exactly_one(&two, &names, &AttributePath::root()).unwrap();
        assert_eq!(err.to_string(), "only one of id, mdm_info_id, and name can be set");

        let one = location_identifiers(Value::Null, Value::Null, Value::from("b9a1"));
        assert!(check_exactly_one(&one, &names, &AttributePath::root()).is_none());

        let pending = location_identifiers(Value::Unknown, Value::from("Paris"), Value::Null);
        assert!(check_exactly_one(&pending, &names, &AttributePath::root()).is_none());
    }

    #[test]
    fn test_exactly_one_of_two() {
        let v = Value::object([("id", Value::Null), ("name", Value::Null)]);
        let err = check_exactly_one(&v, &["id", "name"], &AttributePath::root()).unwrap();
        assert_eq!(err.to_string(), "id or name missing");
        assert_matches!(err, Error::InvalidConfiguration { ref paths, .. } if paths.len() == 2);

        let v = Value::object([("id", Value::Int(1)), ("name", Value::from("x"))]);
        let err = check_exactly_one(&v, &["name", "id"], &AttributePath::root()).unwrap();
        assert_eq!(err.to_string(), "only one of id and name can be set");
    }

    #[test]
    fn test_validate_block() {
        let block = Block::new()
            .attr(
                "client_mode",
                Attribute::optional(AttrType::String).validate(Validator::OneOf(&["MONITOR", "LOCKDOWN"])),
            )
            .attr(
                "key_usage",
                Attribute::optional(AttrType::Int).validate(Validator::IntOneOf(&[0, 1, 4, 5])),
            )
            .attr("name", Attribute::required(AttrType::String))
            .attr(
                "platforms",
                Attribute::optional(AttrType::string_set())
                    .validate(Validator::elements(Validator::OneOf(&["macOS", "iOS"]))),
            );

        let mut diags = Diagnostics::new();
        let value = Value::object([
            ("client_mode", Value::from("STRICT")),
            ("key_usage", Value::Int(3)),
            ("name", Value::Null),
            ("platforms", Value::string_set(["macOS", "Windows"])),
        ]);
        validate_block(&block, &value, &AttributePath::root(), &mut diags);
        assert_eq!(diags.len(), 4);

        let mut diags = Diagnostics::new();
        let value = Value::object([
            ("client_mode", Value::from("LOCKDOWN")),
            ("key_usage", Value::Unknown),
            ("name", Value::from("default")),
            ("platforms", Value::string_set(["macOS"])),
        ]);
        validate_block(&block, &value, &AttributePath::root(), &mut diags);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_time_of_day_and_json() {
        let path = AttributePath::attr("local_time");
        assert!(Validator::TimeOfDay.check(&Value::from("09:30:00"), &Value::Null, &path).is_none());
        assert!(Validator::TimeOfDay.check(&Value::from("9h30"), &Value::Null, &path).is_some());

        let path = AttributePath::attr("source");
        assert!(Validator::Json.check(&Value::from("{\"a\": 1}"), &Value::Null, &path).is_none());
        assert!(Validator::Json.check(&Value::from("{\"a\": "), &Value::Null, &path).is_some());
    }

    #[test]
    fn test_conflicts_with() {
        let block = Block::new()
            .attr("dynamic_password", Attribute::optional(AttrType::Bool))
            .attr(
                "static_password",
                Attribute::optional(AttrType::String).validate(Validator::ConflictsWith(&["dynamic_password"])),
            );
        let mut diags = Diagnostics::new();
        let value = Value::object([
            ("dynamic_password", Value::Bool(true)),
            ("static_password", Value::from("12345678")),
        ]);
        validate_block(&block, &value, &AttributePath::root(), &mut diags);
        assert_eq!(diags.len(), 1);
    }
}
