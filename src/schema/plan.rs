//! Plan modifiers
//!
//! Turns a configuration plus the prior state into the planned state:
//! defaults fill null attributes, computed attributes either keep their prior
//! value or become unknown, and `RequiresReplace` attributes that changed are
//! reported so the host can plan a replacement.

use super::{AttrType, Block, PlanModifier, Role};
use crate::domain::value::Value;
use crate::error::AttributePath;

/// Result of planning a resource change
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub planned: Value,
    pub requires_replace: Vec<AttributePath>,
}

/// Plan a resource change. `prior` is `None` on create.
pub fn plan_resource_change(block: &Block, prior: Option<&Value>, config: &Value) -> PlannedChange {
    let mut requires_replace = Vec::new();
    let (planned, _) = plan_block(block, prior, config, &AttributePath::root(), &mut requires_replace);
    PlannedChange {
        planned,
        requires_replace,
    }
}

fn plan_block(
    block: &Block,
    prior: Option<&Value>,
    config: &Value,
    path: &AttributePath,
    requires_replace: &mut Vec<AttributePath>,
) -> (Value, bool) {
    let prior = prior.filter(|p| p.is_known());
    let mut planned = block.null_object();
    let mut changed = prior.is_none();

    // Configurable attributes first: they decide whether anything changed.
    for (name, attr) in block.iter().filter(|(_, a)| a.role.is_configurable()) {
        let attr_path = if path.is_root() {
            AttributePath::attr(name)
        } else {
            path.at(name)
        };
        let prior_value = prior.map(|p| p.get(name));
        let config_value = config.get(name);

        let (value, attr_changed) = if config_value.is_null() {
            match attr.default_value() {
                Some(default) => {
                    let value = plan_nested(&attr.ty, None, &default, &attr_path, requires_replace);
                    let attr_changed = prior_value != Some(&value);
                    (value, attr_changed)
                }
                None if attr.role == Role::OptionalComputed => {
                    // Filled in below once we know whether anything changed.
                    continue;
                }
                None => (Value::Null, prior_value.map_or(false, |p| !p.is_null())),
            }
        } else if config_value.is_unknown() {
            (Value::Unknown, true)
        } else {
            match &attr.ty {
                AttrType::Object(nested) => {
                    let prior_nested = prior_value.filter(|p| p.is_known());
                    let (value, nested_changed) =
                        plan_block(nested, prior_nested, config_value, &attr_path, requires_replace);
                    (value, nested_changed || prior_nested.is_none())
                }
                ty => {
                    let value = plan_nested(ty, None, config_value, &attr_path, requires_replace);
                    let attr_changed = prior_value != Some(&value);
                    (value, attr_changed)
                }
            }
        };

        if attr_changed
            && prior.is_some()
            && attr.has_modifier(&PlanModifier::RequiresReplace)
            && value.is_known()
        {
            requires_replace.push(attr_path);
        }
        changed |= attr_changed;
        planned.set(name, value);
    }

    // Computed values: keep the prior value unless something changed.
    for (name, attr) in block.iter() {
        let computed_from_state = match attr.role {
            Role::Computed => true,
            Role::OptionalComputed => config.get(name).is_null() && attr.default_value().is_none(),
            _ => false,
        };
        if !computed_from_state {
            continue;
        }
        let prior_value = prior.map(|p| p.get(name)).filter(|p| p.is_known());
        let value = match prior_value {
            Some(p) if !changed || attr.has_modifier(&PlanModifier::UseStateForUnknown) => p.clone(),
            _ => Value::Unknown,
        };
        planned.set(name, value);
    }

    (planned, changed)
}

/// Plan a non-object value: collections of objects get their element
/// defaults filled in, everything else is taken as configured.
fn plan_nested(
    ty: &AttrType,
    prior: Option<&Value>,
    config: &Value,
    path: &AttributePath,
    requires_replace: &mut Vec<AttributePath>,
) -> Value {
    if !config.is_known() {
        return config.clone();
    }
    match (ty, config) {
        (AttrType::Object(block), _) => plan_block(block, prior, config, path, requires_replace).0,
        (AttrType::List(element), Value::List(items)) if !element.is_scalar() => Value::List(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| plan_nested(element, None, item, &path.index(i), &mut Vec::new()))
                .collect(),
        ),
        (AttrType::Set(element), Value::Set(items)) if !element.is_scalar() => Value::Set(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| plan_nested(element, None, item, &path.index(i), &mut Vec::new()))
                .collect(),
        ),
        _ => config.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{int_id, version, Attribute};

    fn rule_block() -> Block {
        Block::new()
            .attr("id", int_id())
            .attr("configuration_id", Attribute::required(AttrType::Int).requires_replace())
            .attr("description", Attribute::optional(AttrType::String).default(""))
            .attr("primary_users", Attribute::optional(AttrType::string_set()).default(Value::empty_set()))
            .attr("version", version())
    }

    fn config(description: Value) -> Value {
        Value::object([
            ("id", Value::Null),
            ("configuration_id", Value::Int(1)),
            ("description", description),
            ("primary_users", Value::Null),
            ("version", Value::Null),
        ])
    }

    #[test]
    fn test_plan_create_fills_defaults_and_unknowns() {
        let change = plan_resource_change(&rule_block(), None, &config(Value::Null));
        let planned = change.planned;

        assert!(planned.get("id").is_unknown());
        assert!(planned.get("version").is_unknown());
        assert_eq!(planned.get("description"), &Value::from(""));
        assert_eq!(planned.get("primary_users"), &Value::empty_set());
        assert!(change.requires_replace.is_empty());
    }

    #[test]
    fn test_plan_without_changes_keeps_state() {
        let state = Value::object([
            ("id", Value::Int(12)),
            ("configuration_id", Value::Int(1)),
            ("description", Value::from("")),
            ("primary_users", Value::empty_set()),
            ("version", Value::Int(1)),
        ]);
        let change = plan_resource_change(&rule_block(), Some(&state), &config(Value::Null));
        assert_eq!(change.planned, state);
    }

    #[test]
    fn test_plan_update_marks_version_unknown_but_keeps_id() {
        let state = Value::object([
            ("id", Value::Int(12)),
            ("configuration_id", Value::Int(1)),
            ("description", Value::from("")),
            ("primary_users", Value::empty_set()),
            ("version", Value::Int(1)),
        ]);
        let change = plan_resource_change(&rule_block(), Some(&state), &config(Value::from("new")));
        assert_eq!(change.planned.get("id"), &Value::Int(12));
        assert!(change.planned.get("version").is_unknown());
        assert!(change.requires_replace.is_empty());
    }

    #[test]
    fn test_plan_requires_replace() {
        let state = Value::object([
            ("id", Value::Int(12)),
            ("configuration_id", Value::Int(2)),
            ("description", Value::from("")),
            ("primary_users", Value::empty_set()),
            ("version", Value::Int(1)),
        ]);
        let change = plan_resource_change(&rule_block(), Some(&state), &config(Value::Null));
        assert_eq!(change.requires_replace, vec![AttributePath::attr("configuration_id")]);
    }

    #[test]
    fn test_plan_nested_object_keeps_computed_secret() {
        let secret_block = Block::new()
            .attr(
                "secret",
                Attribute::computed(AttrType::String).use_state_for_unknown().read_only(),
            )
            .attr("meta_business_unit_id", Attribute::required(AttrType::Int))
            .attr("tag_ids", Attribute::optional(AttrType::int_set()).default(Value::empty_set()));
        let block = Block::new()
            .attr("id", int_id())
            .attr("enrollment", Attribute::required(secret_block.into_type()));

        let state = Value::object([
            ("id", Value::Int(3)),
            (
                "enrollment",
                Value::object([
                    ("secret", Value::from("s3cr3t")),
                    ("meta_business_unit_id", Value::Int(1)),
                    ("tag_ids", Value::empty_set()),
                ]),
            ),
        ]);
        let config = Value::object([
            ("id", Value::Null),
            (
                "enrollment",
                Value::object([
                    ("secret", Value::Null),
                    ("meta_business_unit_id", Value::Int(2)),
                    ("tag_ids", Value::Null),
                ]),
            ),
        ]);

        let change = plan_resource_change(&block, Some(&state), &config);
        let enrollment = change.planned.get("enrollment");
        assert_eq!(enrollment.get_str("secret"), Some("s3cr3t"));
        assert_eq!(enrollment.get_int("meta_business_unit_id"), Some(2));
        assert_eq!(enrollment.get("tag_ids"), &Value::empty_set());
        assert_eq!(change.planned.get_int("id"), Some(3));
    }
}
