//! Per-operation view of a resource's attributes
//!
//! The host hands each operation the resource id, the current attributes
//! (configuration merged over prior state) and, after the first apply, the
//! prior attributes so operations can tell what changed.

use crate::attr::{AttrMap, AttrValue, typify_string_list};
use crate::error::{Error, Result};

static NULL: AttrValue = AttrValue::Null;

/// Attributes and id of one resource or data source instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: String,
    attrs: AttrMap,
    prior: Option<AttrMap>,
}

impl ResourceData {
    /// Fresh instance with no id and no prior state
    pub fn new(attrs: AttrMap) -> Self {
        Self {
            id: String::new(),
            attrs,
            prior: None,
        }
    }

    /// Instance with an id and no prior state (e.g. an import)
    pub fn with_id(id: impl Into<String>, attrs: AttrMap) -> Self {
        Self {
            id: id.into(),
            attrs,
            prior: None,
        }
    }

    /// Instance with prior state; `attrs` is the planned attribute set
    pub fn from_prior(id: impl Into<String>, prior: AttrMap, attrs: AttrMap) -> Self {
        Self {
            id: id.into(),
            attrs,
            prior: Some(prior),
        }
    }

    /// The resource id; empty means "does not exist"
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Mark the resource as gone
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// Raw attribute value; absent attributes read as `Null`
    pub fn get(&self, key: &str) -> &AttrValue {
        self.attrs.get(key).unwrap_or(&NULL)
    }

    /// String attribute; absent reads as `""`
    pub fn get_string(&self, key: &str) -> Result<String> {
        match self.get(key) {
            AttrValue::Null => Ok(String::new()),
            AttrValue::String(s) => Ok(s.clone()),
            other => Err(type_error(key, "string", other)),
        }
    }

    /// Integer attribute; absent reads as `0`
    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.get(key) {
            AttrValue::Null => Ok(0),
            AttrValue::Int(i) => Ok(*i),
            other => Err(type_error(key, "int", other)),
        }
    }

    /// List or set of strings; absent reads as empty
    pub fn get_string_list(&self, key: &str) -> Result<Vec<String>> {
        match self.get(key) {
            AttrValue::Null => Ok(Vec::new()),
            AttrValue::List(items) | AttrValue::Set(items) => typify_string_list(items)
                .map_err(|e| Error::attribute_type(format!("{}: {}", key, e))),
            other => Err(type_error(key, "list", other)),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Whether `key` differs from the prior state
    ///
    /// Without prior state any non-zero value counts as a change.
    pub fn has_change(&self, key: &str) -> bool {
        match &self.prior {
            None => !self.get(key).is_zero(),
            Some(prior) => prior.get(key).unwrap_or(&NULL) != self.get(key),
        }
    }

    pub fn attributes(&self) -> &AttrMap {
        &self.attrs
    }

    pub fn into_attributes(self) -> AttrMap {
        self.attrs
    }
}

fn type_error(key: &str, expected: &str, got: &AttrValue) -> Error {
    Error::attribute_type(format!(
        "attribute {:?} must be a {}, got {}",
        key,
        expected,
        got.type_name()
    ))
}
