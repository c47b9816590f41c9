//! Conversions between generic attribute values and typed values

use super::{AttrMap, AttrValue};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Extract the contents of a zero-or-one nested block
///
/// Lists, sets and blocks are accepted. An empty container, a container whose
/// first element is null, or a null value yield `None`. Any other variant is a
/// type-contract violation.
pub fn extract_single_nested_block(value: &AttrValue) -> Result<Option<&AttrMap>> {
    let first = match value {
        AttrValue::Null => return Ok(None),
        AttrValue::Block(block) => return Ok(block.as_ref()),
        AttrValue::List(items) | AttrValue::Set(items) => items.first(),
        other => {
            return Err(Error::attribute_type(format!(
                "expected a list, set or block, got {}",
                other.type_name()
            )));
        }
    };

    match first {
        None | Some(AttrValue::Null) => Ok(None),
        Some(AttrValue::Map(map)) => Ok(Some(map)),
        Some(other) => Err(Error::attribute_type(format!(
            "nested block element must be a map, got {}",
            other.type_name()
        ))),
    }
}

/// Convert a set of strings into a list, in the set's iteration order
pub fn set_to_string_list(value: &AttrValue) -> Result<Vec<String>> {
    match value {
        AttrValue::Null => Ok(Vec::new()),
        AttrValue::Set(items) => typify_string_list(items),
        other => Err(Error::attribute_type(format!(
            "expected a set, got {}",
            other.type_name()
        ))),
    }
}

/// Convert a map of strings into a typed map
pub fn set_to_string_map(value: &AttrValue) -> Result<BTreeMap<String, String>> {
    match value {
        AttrValue::Null => Ok(BTreeMap::new()),
        AttrValue::Map(map) => typify_string_map(map),
        other => Err(Error::attribute_type(format!(
            "expected a map, got {}",
            other.type_name()
        ))),
    }
}

pub fn typify_string_list(values: &[AttrValue]) -> Result<Vec<String>> {
    values
        .iter()
        .map(|v| match v {
            AttrValue::String(s) => Ok(s.clone()),
            other => Err(Error::attribute_type(format!(
                "list element must be a string, got {}",
                other.type_name()
            ))),
        })
        .collect()
}

pub fn untypify_string_list(values: &[String]) -> Vec<AttrValue> {
    values.iter().map(AttrValue::from).collect()
}

pub fn typify_string_map(values: &AttrMap) -> Result<BTreeMap<String, String>> {
    values
        .iter()
        .map(|(k, v)| match v {
            AttrValue::String(s) => Ok((k.clone(), s.clone())),
            other => Err(Error::attribute_type(format!(
                "map value for {:?} must be a string, got {}",
                k,
                other.type_name()
            ))),
        })
        .collect()
}

pub fn untypify_string_map(values: &BTreeMap<String, String>) -> AttrMap {
    values
        .iter()
        .map(|(k, v)| (k.clone(), AttrValue::from(v)))
        .collect()
}
