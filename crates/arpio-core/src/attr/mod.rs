//! Host attribute values
//!
//! Every attribute the host hands to a resource is one of a small, closed set
//! of variants. Conversions to typed Rust values live in [`marshal`].

pub mod marshal;

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;

pub use marshal::{
    extract_single_nested_block, set_to_string_list, set_to_string_map, typify_string_list,
    typify_string_map, untypify_string_list, untypify_string_map,
};

/// String-keyed attribute map, the shape of a resource or a nested block
pub type AttrMap = BTreeMap<String, AttrValue>;

/// A generic attribute value
#[derive(Debug, Clone, Default)]
pub enum AttrValue {
    /// Absent / unknown
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// String
    String(String),
    /// Ordered list
    List(Vec<AttrValue>),
    /// Unordered collection of distinct values
    Set(Vec<AttrValue>),
    /// String-keyed map
    Map(AttrMap),
    /// Zero or one nested block
    Block(Option<AttrMap>),
}

impl AttrValue {
    /// Build a set, dropping duplicates while keeping first-seen order
    pub fn set(items: impl IntoIterator<Item = AttrValue>) -> Self {
        let mut out: Vec<AttrValue> = Vec::new();
        for item in items {
            if !out.contains(&item) {
                out.push(item);
            }
        }
        AttrValue::Set(out)
    }

    /// Build a set of strings
    pub fn string_set<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self::set(items.into_iter().map(|s| AttrValue::String(s.into())))
    }

    /// Build a present nested block
    pub fn block(attrs: AttrMap) -> Self {
        AttrValue::Block(Some(attrs))
    }

    /// Whether the value is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Whether the value is the zero value of its kind
    pub fn is_zero(&self) -> bool {
        match self {
            AttrValue::Null => true,
            AttrValue::Bool(b) => !b,
            AttrValue::Int(i) => *i == 0,
            AttrValue::String(s) => s.is_empty(),
            AttrValue::List(items) | AttrValue::Set(items) => items.is_empty(),
            AttrValue::Map(map) => map.is_empty(),
            AttrValue::Block(block) => block.is_none(),
        }
    }

    /// Variant name, used in type errors
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Null => "null",
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::String(_) => "string",
            AttrValue::List(_) => "list",
            AttrValue::Set(_) => "set",
            AttrValue::Map(_) => "map",
            AttrValue::Block(_) => "block",
        }
    }

    /// Borrow the string payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON value into an attribute value
    ///
    /// Arrays become lists and objects become maps; schema normalization
    /// turns them into sets or blocks where the schema says so.
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(match value {
            Value::Null => AttrValue::Null,
            Value::Bool(b) => AttrValue::Bool(*b),
            Value::Number(n) => AttrValue::Int(n.as_i64().ok_or_else(|| {
                Error::attribute_type(format!("{} is not an integer", n))
            })?),
            Value::String(s) => AttrValue::String(s.clone()),
            Value::Array(items) => {
                AttrValue::List(items.iter().map(Self::from_json).collect::<Result<_>>()?)
            }
            Value::Object(map) => AttrValue::Map(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), Self::from_json(v)?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Convert into a JSON value; a present block is rendered as a one-element array
    pub fn to_json(&self) -> Value {
        match self {
            AttrValue::Null => Value::Null,
            AttrValue::Bool(b) => Value::Bool(*b),
            AttrValue::Int(i) => Value::from(*i),
            AttrValue::String(s) => Value::String(s.clone()),
            AttrValue::List(items) | AttrValue::Set(items) => {
                Value::Array(items.iter().map(Self::to_json).collect())
            }
            AttrValue::Map(map) => map_to_json(map),
            AttrValue::Block(None) => Value::Array(Vec::new()),
            AttrValue::Block(Some(map)) => Value::Array(vec![map_to_json(map)]),
        }
    }
}

fn map_to_json(map: &AttrMap) -> Value {
    Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

/// Convert a JSON object into an attribute map
pub fn attr_map_from_json(value: &Value) -> Result<AttrMap> {
    match value {
        Value::Null => Ok(AttrMap::new()),
        Value::Object(_) => match AttrValue::from_json(value)? {
            AttrValue::Map(map) => Ok(map),
            other => Err(Error::attribute_type(format!(
                "expected an object, got {}",
                other.type_name()
            ))),
        },
        _ => Err(Error::attribute_type("expected an object of attributes")),
    }
}

/// Convert an attribute map into a JSON object
pub fn attr_map_to_json(map: &AttrMap) -> Value {
    map_to_json(map)
}

// Sets compare without regard to order.
impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Null, AttrValue::Null) => true,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Int(a), AttrValue::Int(b)) => a == b,
            (AttrValue::String(a), AttrValue::String(b)) => a == b,
            (AttrValue::List(a), AttrValue::List(b)) => a == b,
            (AttrValue::Set(a), AttrValue::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (AttrValue::Map(a), AttrValue::Map(b)) => a == b,
            (AttrValue::Block(a), AttrValue::Block(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

impl From<&String> for AttrValue {
    fn from(s: &String) -> Self {
        AttrValue::String(s.clone())
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(items: Vec<String>) -> Self {
        AttrValue::List(untypify_string_list(&items))
    }
}

impl From<&[String]> for AttrValue {
    fn from(items: &[String]) -> Self {
        AttrValue::List(untypify_string_list(items))
    }
}

impl From<BTreeMap<String, String>> for AttrValue {
    fn from(map: BTreeMap<String, String>) -> Self {
        AttrValue::Map(untypify_string_map(&map))
    }
}
