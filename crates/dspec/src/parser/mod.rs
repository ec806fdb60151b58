//! Design document parsing.
//!
//! This module turns document text into a typed [`DesignSpec`] while keeping
//! the raw JSON and a map of source locations:
//!
//! - [`parse_document`]: Main entry point for parsing a document
//! - [`ParsedDocument`]: The typed document, raw value and locations
//! - [`LoadOptions`]: Parse and module resolution settings
//!
//! ## Submodules
//!
//! - [`json`]: JSON parser that records line/column per logical path
//! - [`expression`]: Tokenizer for the value expression language
//! - [`media`]: Media query aliases and custom query expansion
//! - [`selectors`]: Selector joining, scoping and pseudo-state expansion
//! - [`units`]: Numeric value, unit parsing and arithmetic
//!
//! ## Example
//!
//! ```rust
//! use dspec::parser::parse_document;
//!
//! let doc = parse_document(r#"{"name": "My Theme", "tokens": []}"#, false).unwrap();
//! assert_eq!(doc.spec.name, "my-theme");
//! assert_eq!(doc.raw["name"], "my-theme");
//! ```

pub mod expression;
pub mod json;
pub mod media;
pub mod selectors;
pub mod units;

pub use crate::parser::expression::{Expression, Segment};
pub use crate::parser::media::{MediaQueryTable, QueryTarget};

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::Result;
use crate::types::{Design, DesignSpec, LocationMap, Token};

static INVALID_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\sA-Z]").expect("valid name pattern"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Settings for reading documents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    /// Skip source location tracking.
    pub compact: bool,
    /// Directory names searched, walking up from the base directory, for
    /// non-relative references.
    pub module_dirs: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            compact: false,
            module_dirs: vec!["node_modules".to_string()],
        }
    }
}

/// One parsed document.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedDocument {
    pub spec: DesignSpec,
    pub raw: Value,
    /// Empty in compact mode.
    pub locations: LocationMap,
}

impl ParsedDocument {
    /// Stamps every token, design and mixin with the owning document's path.
    pub fn with_url(mut self, url: &str) -> Self {
        fn stamp_token(token: &mut Token, url: &str) {
            token.url = Some(url.to_string());
            token.tokens.iter_mut().for_each(|t| stamp_token(t, url));
        }

        fn stamp_design(design: &mut Design, url: &str) {
            design.url = Some(url.to_string());
            design.variants.iter_mut().for_each(|d| stamp_design(d, url));
            design.children.iter_mut().for_each(|d| stamp_design(d, url));
        }

        self.spec.tokens.iter_mut().for_each(|t| stamp_token(t, url));
        self.spec.designs.iter_mut().for_each(|d| stamp_design(d, url));
        self.spec
            .mixins
            .iter_mut()
            .for_each(|m| stamp_design(&mut m.design, url));
        self
    }
}

/// Parses document text.
///
/// In `compact` mode the text goes straight through `serde_json` and no
/// locations are recorded.
pub fn parse_document(source: &str, compact: bool) -> Result<ParsedDocument> {
    let (mut raw, locations) = if compact {
        (json::parse_compact(source)?, LocationMap::new())
    } else {
        json::parse_with_locations(source)?
    };

    if let Some(name) = raw.get("name").and_then(Value::as_str).map(normalize_name) {
        raw["name"] = Value::String(name);
    }

    let spec: DesignSpec = serde_json::from_value(raw.clone())?;

    Ok(ParsedDocument {
        spec,
        raw,
        locations,
    })
}

/// Rewrites a document name with whitespace or uppercase to kebab-case.
pub fn normalize_name(name: &str) -> String {
    if !INVALID_NAME.is_match(name) {
        return name.to_string();
    }

    let normalized = WHITESPACE
        .replace_all(name.trim(), "-")
        .to_lowercase();
    warn!(
        "The name \"{}\" contains whitespace or uppercase letters, renamed to \"{}\"",
        name, normalized
    );
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("base"), "base");
        assert_eq!(normalize_name("Base Theme"), "base-theme");
        assert_eq!(normalize_name("dark  mode"), "dark-mode");
    }

    #[test]
    fn test_compact_mode_skips_locations() {
        let doc = parse_document(r#"{"name": "a", "tokens": [{"name": "x", "value": 1}]}"#, true)
            .unwrap();
        assert!(doc.locations.is_empty());
        assert_eq!(doc.spec.tokens[0].name, "x");
    }

    #[test]
    fn test_locations_recorded() {
        let source = "{\n  \"name\": \"a\",\n  \"tokens\": [{\"name\": \"x\", \"value\": 1}]\n}";
        let doc = parse_document(source, false).unwrap();
        assert!(doc.locations.get("tokens.0").is_some());
        assert!(doc.locations.get("tokens.0.value").is_some());
    }

    #[test]
    fn test_schema_mismatch_is_json_error() {
        let err = parse_document(r#"{"name": "a", "tokens": 3}"#, false).unwrap_err();
        assert!(matches!(err, crate::error::SpecError::Json(_)));
    }

    #[test]
    fn test_with_url_stamps_nested_nodes() {
        let doc = parse_document(
            r#"{"name": "a",
                "tokens": [{"name": "c", "tokens": [{"name": "d", "value": 1}]}],
                "designs": [{"name": "btn", "children": [{"name": "icon"}]}]}"#,
            true,
        )
        .unwrap()
        .with_url("/x/a.json");

        assert_eq!(doc.spec.tokens[0].tokens[0].url.as_deref(), Some("/x/a.json"));
        assert_eq!(doc.spec.designs[0].children[0].url.as_deref(), Some("/x/a.json"));
    }
}
