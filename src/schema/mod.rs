//! Schema Registry primitives
//!
//! Attribute descriptors shared by every resource and data source:
//! - semantic type (scalar or composite)
//! - role (required / optional / computed / optional+computed)
//! - defaults, sensitivity and plan modifiers
//! - validators
//! - the wire mapping the translators follow
//!
//! The registry is the single authoritative source for attribute shape: the
//! translators in [`crate::translate`] never hard-code a field.

pub mod plan;
pub mod validate;

pub use plan::{plan_resource_change, PlannedChange};
pub use validate::{check_exactly_one, validate_block, Constraint, Validator};

use crate::domain::value::Value;
use indexmap::IndexMap;

// =============================================================================
// Types
// =============================================================================

/// Semantic type of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttrType {
    Bool,
    Int,
    String,
    List(Box<AttrType>),
    Set(Box<AttrType>),
    Map(Box<AttrType>),
    Object(Block),
}

impl AttrType {
    pub fn list_of(element: AttrType) -> Self {
        AttrType::List(Box::new(element))
    }

    pub fn set_of(element: AttrType) -> Self {
        AttrType::Set(Box::new(element))
    }

    pub fn map_of(element: AttrType) -> Self {
        AttrType::Map(Box::new(element))
    }

    pub fn string_set() -> Self {
        AttrType::set_of(AttrType::String)
    }

    pub fn int_set() -> Self {
        AttrType::set_of(AttrType::Int)
    }

    pub fn string_list() -> Self {
        AttrType::list_of(AttrType::String)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, AttrType::Bool | AttrType::Int | AttrType::String)
    }

    /// Nested block of an object type
    pub fn block(&self) -> Option<&Block> {
        match self {
            AttrType::Object(block) => Some(block),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AttrType::Bool => "bool",
            AttrType::Int => "number",
            AttrType::String => "string",
            AttrType::List(_) => "list",
            AttrType::Set(_) => "set",
            AttrType::Map(_) => "map",
            AttrType::Object(_) => "object",
        }
    }
}

/// Who may set an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Required,
    Optional,
    Computed,
    OptionalComputed,
}

impl Role {
    pub fn is_computed(self) -> bool {
        matches!(self, Role::Computed | Role::OptionalComputed)
    }

    /// Settable from configuration
    pub fn is_configurable(self) -> bool {
        !matches!(self, Role::Computed)
    }
}

/// Plan-time behaviour attached to an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum PlanModifier {
    /// Carry the prior known value into the plan instead of "unknown"
    UseStateForUnknown,
    /// Default bool used by the older resources
    BoolDefault(bool),
    /// A change forces destroy-then-create
    RequiresReplace,
}

/// Which direction an attribute travels between host and wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Both,
    /// Server-assigned; decoded, never encoded
    ReadOnly,
    /// Sent to the server, never echoed back; state keeps the planned value
    WriteOnly,
    /// Host-only; neither encoded nor decoded
    Local,
}

/// Bidirectional mapping between uppercase host enum names and wire integers
#[derive(Debug, PartialEq, Eq)]
pub struct EnumMap {
    pub name: &'static str,
    pub pairs: &'static [(&'static str, i64)],
}

impl EnumMap {
    pub fn to_wire(&self, name: &str) -> Option<i64> {
        self.pairs.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    pub fn from_wire(&self, code: i64) -> Option<&'static str> {
        self.pairs.iter().find(|(_, v)| *v == code).map(|(n, _)| *n)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.pairs.iter().map(|(n, _)| *n).collect()
    }
}

/// How an attribute maps onto the wire record
#[derive(Debug, Clone, PartialEq)]
pub struct WireMapping {
    /// Wire field name when it differs from the attribute name
    pub name: Option<&'static str>,
    pub direction: Direction,
    /// Decode an empty wire list as a null set rather than an empty one
    pub nullable_empty: bool,
    /// Integer-coded enumeration
    pub enum_map: Option<&'static EnumMap>,
}

impl Default for WireMapping {
    fn default() -> Self {
        Self {
            name: None,
            direction: Direction::Both,
            nullable_empty: false,
            enum_map: None,
        }
    }
}

// =============================================================================
// Attribute
// =============================================================================

/// Attribute descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub ty: AttrType,
    pub role: Role,
    pub description: &'static str,
    pub sensitive: bool,
    /// Static default applied when the configuration leaves the attribute null
    pub default: Option<Value>,
    pub modifiers: Vec<PlanModifier>,
    pub validators: Vec<Validator>,
    pub wire: WireMapping,
}

impl Attribute {
    fn new(ty: AttrType, role: Role) -> Self {
        Self {
            ty,
            role,
            description: "",
            sensitive: false,
            default: None,
            modifiers: Vec::new(),
            validators: Vec::new(),
            wire: WireMapping::default(),
        }
    }

    pub fn required(ty: AttrType) -> Self {
        Self::new(ty, Role::Required)
    }

    pub fn optional(ty: AttrType) -> Self {
        Self::new(ty, Role::Optional)
    }

    pub fn computed(ty: AttrType) -> Self {
        Self::new(ty, Role::Computed)
    }

    pub fn optional_computed(ty: AttrType) -> Self {
        Self::new(ty, Role::OptionalComputed)
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Static default; a defaulted attribute is always optional+computed
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.role = Role::OptionalComputed;
        self
    }

    pub fn bool_default(mut self, value: bool) -> Self {
        self.modifiers.push(PlanModifier::BoolDefault(value));
        self.role = Role::OptionalComputed;
        self
    }

    pub fn use_state_for_unknown(mut self) -> Self {
        self.modifiers.push(PlanModifier::UseStateForUnknown);
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.modifiers.push(PlanModifier::RequiresReplace);
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn wire_name(mut self, name: &'static str) -> Self {
        self.wire.name = Some(name);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.wire.direction = Direction::ReadOnly;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.wire.direction = Direction::WriteOnly;
        self
    }

    pub fn local(mut self) -> Self {
        self.wire.direction = Direction::Local;
        self
    }

    pub fn nullable_empty(mut self) -> Self {
        self.wire.nullable_empty = true;
        self
    }

    pub fn enum_map(mut self, map: &'static EnumMap) -> Self {
        self.wire.enum_map = Some(map);
        self
    }

    /// Field name on the wire
    pub fn wire_field<'a>(&'a self, name: &'a str) -> &'a str {
        self.wire.name.unwrap_or(name)
    }

    pub fn has_modifier(&self, modifier: &PlanModifier) -> bool {
        self.modifiers.contains(modifier)
    }

    /// Default from either a static default or a bool default modifier
    pub fn default_value(&self) -> Option<Value> {
        if let Some(value) = &self.default {
            return Some(value.clone());
        }
        self.modifiers.iter().find_map(|m| match m {
            PlanModifier::BoolDefault(b) => Some(Value::Bool(*b)),
            _ => None,
        })
    }
}

// =============================================================================
// Block & Schema
// =============================================================================

/// Ordered set of attributes; encode iterates in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    attributes: IndexMap<&'static str, Attribute>,
    constraints: Vec<Constraint>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    /// Append every attribute of another block (mix-ins)
    pub fn merge(mut self, other: Block) -> Self {
        self.attributes.extend(other.attributes);
        self.constraints.extend(other.constraints);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (*k, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&'static str, &mut Attribute)> {
        self.attributes.iter_mut().map(|(k, v)| (*k, v))
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn clear_constraints(&mut self) {
        self.constraints.clear();
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Object value with every attribute null
    pub fn null_object(&self) -> Value {
        Value::object(self.attributes.keys().map(|k| (*k, Value::Null)))
    }

    /// Wrap as an object attribute type
    pub fn into_type(self) -> AttrType {
        AttrType::Object(self)
    }
}

/// Top-level schema of a resource, data source or the provider itself
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub description: &'static str,
    pub block: Block,
}

impl Schema {
    pub fn new(description: &'static str, block: Block) -> Self {
        Self { description, block }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.get(name)
    }

    /// Names of sensitive top-level attributes
    pub fn sensitive_attributes(&self) -> Vec<&'static str> {
        self.block
            .iter()
            .filter(|(_, a)| a.sensitive)
            .map(|(n, _)| n)
            .collect()
    }
}

// =============================================================================
// Common Attributes
// =============================================================================

/// Server-assigned integer primary key
pub fn int_id() -> Attribute {
    Attribute::computed(AttrType::Int)
        .describe("ID of the object.")
        .use_state_for_unknown()
        .read_only()
}

/// Server-assigned UUID primary key
pub fn uuid_id() -> Attribute {
    Attribute::computed(AttrType::String)
        .describe("UUID of the object.")
        .use_state_for_unknown()
        .read_only()
}

/// Server-maintained mutation counter
pub fn version() -> Attribute {
    Attribute::computed(AttrType::Int)
        .describe("Version of the object, incremented by the server on every change.")
        .read_only()
}

/// Optional set of tag IDs that the server always returns
pub fn tag_ids(description: &'static str) -> Attribute {
    Attribute::optional(AttrType::int_set())
        .describe(description)
        .default(Value::empty_set())
}

/// Optional string set that the server always returns
pub fn string_set(description: &'static str) -> Attribute {
    Attribute::optional(AttrType::string_set())
        .describe(description)
        .default(Value::empty_set())
}
