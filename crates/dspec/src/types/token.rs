//! Design tokens and their flattened references.
//!
//! A [`Token`] is one named design value. Tokens nest: a child token extends
//! its parent's dotted path and inherits the parent's declared type and tags
//! when it has none of its own.
//!
//! ```json
//! {
//!   "name": "color",
//!   "type": "color",
//!   "tokens": [
//!     { "name": "primary", "value": { "@": "#336699", "@dark": "#112233" } }
//!   ]
//! }
//! ```
//!
//! Flattening (see [`crate::maps::tokens`]) turns the tree into a
//! [`TokenMap`] keyed by path: `color.primary` and `color.primary.@dark`.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::location::SourceLocation;

/// Declared type of a token, used for literal validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Color,
    Unit,
    Number,
    Boolean,
    #[default]
    Any,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Color => "color",
            TokenType::Unit => "unit",
            TokenType::Number => "number",
            TokenType::Boolean => "boolean",
            TokenType::Any => "any",
        };
        f.write_str(name)
    }
}

/// A literal token value as written in the document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// A token's `value`: either one literal or a map keyed by `@`/`.`/`@query`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Scalar(Scalar),
    Scoped(IndexMap<String, Scalar>),
}

impl TokenValue {
    /// The value used for the bare token path, if any.
    pub fn default_value(&self) -> Option<String> {
        match self {
            TokenValue::Scalar(s) => Some(s.to_string()),
            TokenValue::Scoped(map) => map
                .get("@")
                .or_else(|| map.get("."))
                .map(|s| s.to_string()),
        }
    }
}

/// One node of the token tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TokenType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<TokenValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<Token>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resolved path of the owning document, stamped by the loader.
    #[serde(skip)]
    pub url: Option<String>,
}

/// One resolvable leaf of the flattened token tree.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenRef {
    /// Dotted path, e.g. `color.primary.@dark`.
    pub path: String,
    /// Unresolved value text.
    pub value: String,
    pub kind: TokenType,
    pub tags: Vec<String>,
    /// Resolved path of the document that declared the token.
    pub url: Option<String>,
    /// Logical JSON path of the value inside its document.
    pub pointer: String,
    pub location: Option<SourceLocation>,
}

/// Flattened tokens keyed by dotted path, in declaration order.
pub type TokenMap = IndexMap<String, TokenRef>;
