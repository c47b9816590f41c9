//! Selection rules <-> `resources` block
//!
//! The API keeps a list of typed rules. Configuration keeps a single
//! `resources { arns = [...], tags = {...} }` block: every ARN rule is merged
//! into the one `arns` set and every tag rule becomes an entry of `tags`.

use std::collections::{BTreeMap, BTreeSet};

use crate::attr::{
    AttrMap, AttrValue, extract_single_nested_block, set_to_string_list, set_to_string_map,
    untypify_string_map,
};
use crate::error::{Error, Result};
use crate::model::SelectionRule;
use crate::validate::is_arn;

/// Attribute holding the selection rule block
pub const RESOURCES_KEY: &str = "resources";
/// Block key holding the ARN set
pub const ARNS_KEY: &str = "arns";
/// Block key holding the tag map
pub const TAGS_KEY: &str = "tags";

/// Build the rule list from a `resources` attribute
///
/// Yields at most one ARN rule, holding every ARN sorted, followed by one tag
/// rule per tag. An absent block yields no rules.
pub fn selection_rules_from_attr(value: &AttrValue) -> Result<Vec<SelectionRule>> {
    let Some(block) = extract_single_nested_block(value)? else {
        return Ok(Vec::new());
    };

    let mut rules = Vec::new();

    let mut arns = set_to_string_list(block.get(ARNS_KEY).unwrap_or(&AttrValue::Null))?;
    if let Some(bad) = arns.iter().find(|arn| !is_arn(arn)) {
        return Err(Error::invalid_input(format!("{:?} is not a valid ARN", bad)));
    }
    if !arns.is_empty() {
        arns.sort();
        arns.dedup();
        rules.push(SelectionRule::Arn { arns });
    }

    let tags = set_to_string_map(block.get(TAGS_KEY).unwrap_or(&AttrValue::Null))?;
    rules.extend(
        tags.into_iter()
            .map(|(name, value)| SelectionRule::Tag { name, value }),
    );

    Ok(rules)
}

/// Render rules into the `resources` attribute
///
/// When `existing` holds a block only its `arns` and `tags` keys are
/// replaced. Without a block the attribute stays as it was.
pub fn flatten_selection_rules(rules: &[SelectionRule], existing: &AttrValue) -> Result<AttrValue> {
    let mut arns = BTreeSet::new();
    let mut tags = BTreeMap::new();

    for rule in rules {
        match rule {
            SelectionRule::Arn { arns: rule_arns } => arns.extend(rule_arns.iter().cloned()),
            SelectionRule::Tag { name, value } => {
                tags.insert(name.clone(), value.clone());
            }
        }
    }

    let mut block: AttrMap = match extract_single_nested_block(existing)? {
        Some(block) => block.clone(),
        None => return Ok(existing.clone()),
    };

    block.insert(ARNS_KEY.to_string(), AttrValue::string_set(arns));
    block.insert(TAGS_KEY.to_string(), AttrValue::Map(untypify_string_map(&tags)));

    Ok(AttrValue::block(block))
}
