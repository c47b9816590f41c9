//! Attribute schemas
//!
//! A [`Schema`] declares the attributes of the provider block, a resource or a
//! data source. Schemas are checked for internal consistency with
//! [`Schema::internal_validate`] and applied to raw configuration with
//! [`Schema::normalize_with`], which fills defaults, rejects unknown or
//! missing arguments and coerces values into the declared kinds.
//!
//! ## Example
//!
//! ```rust
//! use arpio_core::schema::{Field, FieldKind, Schema};
//!
//! let schema = Schema::new()
//!     .field("name", Field::string().required())
//!     .field("emails", Field::list(FieldKind::String).optional());
//!
//! assert!(schema.internal_validate().is_ok());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::attr::{AttrMap, AttrValue};
use crate::error::{Error, Result};

/// Validator for string values: `(attribute path, value)`
pub type StringValidator = fn(&str, &str) -> Result<()>;

/// Kind of value an attribute holds
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Int,
    Bool,
    List(Box<FieldKind>),
    Set(Box<FieldKind>),
    Map(Box<FieldKind>),
    /// Nested block with its own schema, repeated at most `max_items` times
    Block { schema: Schema, max_items: usize },
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => write!(f, "string"),
            FieldKind::Int => write!(f, "int"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::List(elem) => write!(f, "list of {}", elem),
            FieldKind::Set(elem) => write!(f, "set of {}", elem),
            FieldKind::Map(elem) => write!(f, "map of {}", elem),
            FieldKind::Block { .. } => write!(f, "block"),
        }
    }
}

/// Environment variable consulted when an attribute is not configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvDefault {
    pub var: &'static str,
    pub fallback: Option<&'static str>,
}

/// Declaration of one attribute
#[derive(Debug, Clone)]
pub struct Field {
    pub kind: FieldKind,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub description: &'static str,
    pub default: Option<AttrValue>,
    pub env_default: Option<EnvDefault>,
    pub validator: Option<StringValidator>,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            description: "",
            default: None,
            env_default: None,
            validator: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn int() -> Self {
        Self::new(FieldKind::Int)
    }

    pub fn bool() -> Self {
        Self::new(FieldKind::Bool)
    }

    pub fn list(elem: FieldKind) -> Self {
        Self::new(FieldKind::List(Box::new(elem)))
    }

    pub fn set(elem: FieldKind) -> Self {
        Self::new(FieldKind::Set(Box::new(elem)))
    }

    pub fn map(elem: FieldKind) -> Self {
        Self::new(FieldKind::Map(Box::new(elem)))
    }

    pub fn block(schema: Schema, max_items: usize) -> Self {
        Self::new(FieldKind::Block { schema, max_items })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn default(mut self, value: impl Into<AttrValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn env_default(mut self, var: &'static str, fallback: Option<&'static str>) -> Self {
        self.env_default = Some(EnvDefault { var, fallback });
        self
    }

    /// Validate string values, or each string element of a collection
    pub fn validate_with(mut self, validator: StringValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    fn computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}

/// Named attribute declarations
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<&'static str, Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute
    pub fn field(mut self, name: &'static str, field: Field) -> Self {
        self.fields.insert(name, field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Field)> {
        self.fields.iter().map(|(name, field)| (*name, field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check the declarations for contradictions
    pub fn internal_validate(&self) -> Result<()> {
        self.internal_validate_at("")
    }

    fn internal_validate_at(&self, prefix: &str) -> Result<()> {
        for (name, field) in &self.fields {
            let path = join_path(prefix, name);
            let fail = |msg: &str| Err(Error::config(format!("{}: {}", path, msg)));

            if field.required && (field.optional || field.computed) {
                return fail("required cannot be combined with optional or computed");
            }
            if !field.required && !field.optional && !field.computed {
                return fail("one of required, optional or computed must be set");
            }
            if field.required && field.default.is_some() {
                return fail("default cannot be set with required");
            }
            if field.computed_only() && (field.default.is_some() || field.env_default.is_some()) {
                return fail("default cannot be set on a computed-only attribute");
            }
            if let Some(default) = &field.default {
                coerce(&path, &field.kind, default.clone(), None).map_err(|e| {
                    Error::config(format!("{}: default does not match kind: {}", path, e))
                })?;
            }
            if let FieldKind::Block { schema, max_items } = &field.kind {
                if *max_items == 0 {
                    return fail("max_items must be at least 1");
                }
                schema.internal_validate_at(&path)?;
            }
        }
        Ok(())
    }

    /// Normalize configuration using the process environment for env defaults
    pub fn normalize(&self, config: AttrMap) -> Result<AttrMap> {
        self.normalize_with(config, |key| std::env::var(key).ok())
    }

    /// Normalize configuration against this schema
    ///
    /// - unknown arguments and configured computed-only attributes are rejected
    /// - static and environment defaults are applied to unset attributes
    /// - missing required arguments are reported
    /// - values are coerced into the declared kind and validated
    pub fn normalize_with(
        &self,
        config: AttrMap,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<AttrMap> {
        self.normalize_at("", config, &lookup)
    }

    /// Planned attributes: normalized `config` plus computed values carried
    /// over from `prior` where the configuration leaves them unset
    pub fn plan(&self, prior: &AttrMap, config: AttrMap) -> AttrMap {
        let mut planned = config;
        for (name, field) in &self.fields {
            if !field.computed || planned.contains_key(*name) {
                continue;
            }
            if let Some(value) = prior.get(*name) {
                planned.insert(name.to_string(), value.clone());
            }
        }
        planned
    }

    fn normalize_at(
        &self,
        prefix: &str,
        mut config: AttrMap,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<AttrMap> {
        if let Some(unknown) = config.keys().find(|k| !self.fields.contains_key(k.as_str())) {
            return Err(Error::invalid_input(format!(
                "an argument named {:?} is not expected here",
                join_path(prefix, unknown)
            )));
        }

        let mut out = AttrMap::new();
        for (name, field) in &self.fields {
            let path = join_path(prefix, name);
            let value = config.remove(*name).unwrap_or_default();

            let value = if !value.is_null() {
                if field.computed_only() {
                    return Err(Error::invalid_input(format!(
                        "{:?} is computed and cannot be set",
                        path
                    )));
                }
                value
            } else if let Some(default) = &field.default {
                default.clone()
            } else if let Some(env) = field.env_default {
                match lookup(env.var).filter(|v| !v.is_empty()) {
                    Some(v) => AttrValue::String(v),
                    None => env.fallback.map(AttrValue::from).unwrap_or_default(),
                }
            } else {
                AttrValue::Null
            };

            if value.is_null() {
                if field.required {
                    return Err(Error::invalid_input(format!(
                        "the argument {:?} is required, but no definition was found",
                        path
                    )));
                }
                continue;
            }

            let value = coerce(&path, &field.kind, value, Some(lookup))?;
            if let Some(validator) = field.validator {
                run_validator(&path, &value, validator)?;
            }
            out.insert(name.to_string(), value);
        }

        Ok(out)
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn coerce(
    path: &str,
    kind: &FieldKind,
    value: AttrValue,
    lookup: Option<&dyn Fn(&str) -> Option<String>>,
) -> Result<AttrValue> {
    let mismatch = |value: &AttrValue| {
        Error::attribute_type(format!(
            "{:?}: expected {}, got {}",
            path,
            kind,
            value.type_name()
        ))
    };

    match (kind, value) {
        (_, AttrValue::Null) => Ok(AttrValue::Null),

        (FieldKind::String, AttrValue::String(s)) => Ok(AttrValue::String(s)),
        (FieldKind::String, AttrValue::Int(i)) => Ok(AttrValue::String(i.to_string())),
        (FieldKind::String, AttrValue::Bool(b)) => Ok(AttrValue::String(b.to_string())),

        (FieldKind::Int, AttrValue::Int(i)) => Ok(AttrValue::Int(i)),
        (FieldKind::Int, AttrValue::String(s)) => s.trim().parse::<i64>().map(AttrValue::Int).map_err(
            |_| Error::attribute_type(format!("{:?}: {:?} is not an integer", path, s)),
        ),

        (FieldKind::Bool, AttrValue::Bool(b)) => Ok(AttrValue::Bool(b)),
        (FieldKind::Bool, AttrValue::String(s)) => match s.as_str() {
            "true" => Ok(AttrValue::Bool(true)),
            "false" => Ok(AttrValue::Bool(false)),
            _ => Err(Error::attribute_type(format!("{:?}: {:?} is not a bool", path, s))),
        },

        (FieldKind::List(elem), AttrValue::List(items) | AttrValue::Set(items)) => Ok(
            AttrValue::List(coerce_items(path, elem, items, lookup)?),
        ),
        (FieldKind::Set(elem), AttrValue::List(items) | AttrValue::Set(items)) => {
            Ok(AttrValue::set(coerce_items(path, elem, items, lookup)?))
        }
        (FieldKind::Map(elem), AttrValue::Map(map)) => Ok(AttrValue::Map(
            map.into_iter()
                .map(|(k, v)| {
                    let item_path = join_path(path, &k);
                    Ok((k, coerce(&item_path, elem, v, lookup)?))
                })
                .collect::<Result<_>>()?,
        )),

        (FieldKind::Block { schema, max_items }, value) => {
            let block = match value {
                AttrValue::Block(block) => block,
                AttrValue::Map(map) => Some(map),
                AttrValue::List(items) | AttrValue::Set(items) => {
                    if items.len() > *max_items {
                        return Err(Error::invalid_input(format!(
                            "{:?}: at most {} block(s) allowed, got {}",
                            path,
                            max_items,
                            items.len()
                        )));
                    }
                    match items.into_iter().next() {
                        None | Some(AttrValue::Null) => None,
                        Some(AttrValue::Map(map)) => Some(map),
                        Some(other) => return Err(mismatch(&other)),
                    }
                }
                other => return Err(mismatch(&other)),
            };

            let no_env = |_: &str| None;
            let lookup = lookup.unwrap_or(&no_env);
            match block {
                None => Ok(AttrValue::Block(None)),
                Some(map) => Ok(AttrValue::block(schema.normalize_at(path, map, lookup)?)),
            }
        }

        (_, other) => Err(mismatch(&other)),
    }
}

fn coerce_items(
    path: &str,
    elem: &FieldKind,
    items: Vec<AttrValue>,
    lookup: Option<&dyn Fn(&str) -> Option<String>>,
) -> Result<Vec<AttrValue>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| coerce(&format!("{}.{}", path, i), elem, item, lookup))
        .collect()
}

fn run_validator(path: &str, value: &AttrValue, validator: StringValidator) -> Result<()> {
    match value {
        AttrValue::String(s) => validator(path, s),
        AttrValue::List(items) | AttrValue::Set(items) => items
            .iter()
            .filter_map(AttrValue::as_str)
            .try_for_each(|s| validator(path, s)),
        AttrValue::Map(map) => map
            .values()
            .filter_map(AttrValue::as_str)
            .try_for_each(|s| validator(path, s)),
        _ => Ok(()),
    }
}
