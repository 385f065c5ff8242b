//! Host-facing declarative values
//!
//! Every attribute the host hands us is either known, null ("never set") or
//! unknown ("to be computed during apply"). Containers carry the same three
//! states for each element. The wire model never sees `Unknown`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// Value
// =============================================================================

/// A tri-state declarative value
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    /// Empty marker
    #[default]
    Null,
    /// Unresolved marker, resolved by the host before apply
    Unknown,
    Bool(bool),
    Int(i64),
    String(String),
    /// Ordered sequence
    List(Vec<Value>),
    /// Unordered, duplicate-free collection
    Set(BTreeSet<Value>),
    /// String-keyed mapping
    Map(BTreeMap<String, Value>),
    /// Nested object of a fixed attribute schema
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn string_set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Set(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    pub fn int_set<I: IntoIterator<Item = i64>>(items: I) -> Self {
        Value::Set(items.into_iter().map(Value::Int).collect())
    }

    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    /// Build an object from attribute/value pairs
    pub fn object<I, K>(attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(attrs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn empty_set() -> Self {
        Value::Set(BTreeSet::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// Known at this level (element states are not inspected)
    pub fn is_known(&self) -> bool {
        !self.is_null() && !self.is_unknown()
    }

    /// Known all the way down
    pub fn is_fully_known(&self) -> bool {
        match self {
            Value::Unknown => false,
            Value::List(items) => items.iter().all(Value::is_fully_known),
            Value::Set(items) => items.iter().all(Value::is_fully_known),
            Value::Map(entries) | Value::Object(entries) => {
                entries.values().all(Value::is_fully_known)
            }
            _ => true,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Object(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Elements of a list or set, in iteration order
    pub fn elements(&self) -> Vec<&Value> {
        match self {
            Value::List(items) => items.iter().collect(),
            Value::Set(items) => items.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Attribute of an object value; `Null` when absent or not an object
    pub fn get(&self, name: &str) -> &Value {
        static NULL: Value = Value::Null;
        match self {
            Value::Object(attrs) => attrs.get(name).unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    /// Set an attribute on an object value; no-op on other shapes
    pub fn set(&mut self, name: &str, value: Value) {
        if let Value::Object(attrs) = self {
            attrs.insert(name.to_string(), value);
        }
    }

    /// Known, non-empty string attribute
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).as_str()
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).as_int()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).as_bool()
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Unknown => "unknown",
            Value::Bool(_) => "bool",
            Value::Int(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Unknown => write!(f, "(known after apply)"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Set(items) => {
                write!(f, "toset([")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "])")
            }
            Value::Map(entries) | Value::Object(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_equality_ignores_order_and_duplicates() {
        let a = Value::string_set(["un", "deux", "un"]);
        let b = Value::string_set(["deux", "un"]);
        assert_eq!(a, b);
        assert_eq!(a.elements().len(), 2);

        let list_a = Value::string_list(["un", "deux"]);
        let list_b = Value::string_list(["deux", "un"]);
        assert_ne!(list_a, list_b);
    }

    #[test]
    fn test_object_accessors() {
        let mut obj = Value::object([
            ("name", Value::from("default")),
            ("batch_size", Value::Int(50)),
            ("description", Value::Null),
        ]);

        assert_eq!(obj.get_str("name"), Some("default"));
        assert_eq!(obj.get_int("batch_size"), Some(50));
        assert!(obj.get("description").is_null());
        assert!(obj.get("missing").is_null());

        obj.set("description", Value::Unknown);
        assert!(obj.get("description").is_unknown());
        assert!(!obj.is_fully_known());
    }

    #[test]
    fn test_display() {
        let v = Value::object([
            ("tags", Value::int_set([2, 1])),
            ("name", Value::from("x")),
        ]);
        assert_eq!(v.to_string(), "{name = \"x\", tags = toset([1, 2])}");
    }
}
