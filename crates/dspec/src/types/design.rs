//! Style rule definitions and their flattened selector groups.
//!
//! A [`Design`] names a selector list and a rule map. Rule values are either
//! plain literals or maps keyed by query (`@dark`), default (`@`/`.`) or
//! pseudo state (`:hover`):
//!
//! ```json
//! {
//!   "name": "btn",
//!   "rules": {
//!     "color": { "@": "@color", "@dark": "white", ":hover": "@color.hover" }
//!   },
//!   "variants": [{ "name": "primary", "rules": { "background": "@color" } }]
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::location::SourceLocation;

/// What kind of selector a [`Design`] contributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DesignKind {
    #[default]
    Element,
    Pseudo,
    PseudoElement,
    PseudoClass,
    PseudoState,
}

/// A rule value: a literal or a map keyed by query, default or pseudo state.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RuleValue {
    Literal(String),
    Scoped(RuleMap),
}

/// Property name to rule value, in declaration order.
pub type RuleMap = IndexMap<String, RuleValue>;

impl RuleValue {
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            RuleValue::Literal(s) => Some(s),
            RuleValue::Scoped(_) => None,
        }
    }
}

impl From<&str> for RuleValue {
    fn from(value: &str) -> Self {
        RuleValue::Literal(value.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRuleValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Scoped(IndexMap<String, RawRuleValue>),
}

impl From<RawRuleValue> for RuleValue {
    fn from(raw: RawRuleValue) -> Self {
        match raw {
            RawRuleValue::Bool(b) => RuleValue::Literal(b.to_string()),
            RawRuleValue::Number(n) => RuleValue::Literal(n.to_string()),
            RawRuleValue::Text(s) => RuleValue::Literal(s),
            RawRuleValue::Scoped(map) => {
                RuleValue::Scoped(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl<'de> Deserialize<'de> for RuleValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawRuleValue::deserialize(deserializer).map(RuleValue::from)
    }
}

/// Deep, key-additive merge: scoped values gain new sub-keys, literals are
/// replaced.
pub fn merge_rules(target: &mut RuleMap, source: &RuleMap) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(RuleValue::Scoped(existing)), RuleValue::Scoped(incoming)) => {
                merge_rules(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// One style rule definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: DesignKind,
    /// Defaults to `.name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<Vec<String>>,
    #[serde(default, alias = "styles")]
    pub rules: RuleMap,
    /// Shorthand for `--name` custom property rules.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: RuleMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Design>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Design>,
    #[serde(default)]
    pub root: bool,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub direct_children: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip)]
    pub url: Option<String>,
}

impl Design {
    /// Declared selectors, or `.name`.
    pub fn own_selectors(&self) -> Vec<String> {
        self.selectors
            .clone()
            .unwrap_or_else(|| vec![format!(".{}", self.name)])
    }
}

/// A design template stamped out once per selected token.
///
/// Every `@this` in names, selectors and rule keys becomes the token name;
/// in rule values it becomes `@group.token`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mixin {
    pub group: String,
    /// Token names under `group`; empty selects every direct child.
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(flatten)]
    pub design: Design,
}

/// Kind of a simple selector, used by strict tag filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Class,
    Id,
    Attribute,
    Element,
}

impl TagType {
    pub fn of(selector: &str) -> Self {
        match selector.trim_start().chars().next() {
            Some('.') => TagType::Class,
            Some('#') => TagType::Id,
            Some('[') => TagType::Attribute,
            _ => TagType::Element,
        }
    }
}

/// One flattened selector group.
#[derive(Clone, Debug, PartialEq)]
pub struct DesignRef {
    /// Name of the top-level design this group came from.
    pub name: String,
    pub kind: DesignKind,
    /// Fully joined and scoped selectors.
    pub selectors: Vec<String>,
    /// Rules after pseudo-state extraction.
    pub rules: RuleMap,
    pub layer: Option<String>,
    pub root: bool,
    pub important: bool,
    pub url: Option<String>,
    pub pointer: String,
    pub location: Option<SourceLocation>,
}

/// Flattened designs keyed by joined selector string.
pub type DesignMap = IndexMap<String, DesignRef>;
