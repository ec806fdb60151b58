//! The design document as written on disk.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::animation::Animation;
use crate::types::design::{Design, Mixin};
use crate::types::font::FontFace;
use crate::types::token::Token;

/// How bracketed custom queries (`[dark]`) become selectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// `[dark]` becomes `.dark`.
    #[default]
    Class,
    /// `[dark]` becomes `#dark`.
    Id,
    /// `[dark]` stays an attribute selector.
    Attribute,
}

/// A media query alias: a bare condition or a detailed entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaQuery {
    Alias(String),
    Detailed {
        query: String,
        #[serde(default)]
        group: Option<String>,
        #[serde(default, rename = "mediaQuery")]
        media_query: Option<String>,
        #[serde(default)]
        scheme: Option<String>,
    },
}

impl MediaQuery {
    pub fn query(&self) -> &str {
        match self {
            MediaQuery::Alias(query) => query,
            MediaQuery::Detailed { query, .. } => query,
        }
    }

    /// `light`/`dark` for color scheme aliases.
    ///
    /// Bare aliases infer the scheme from their text.
    pub fn scheme(&self) -> Option<&str> {
        match self {
            MediaQuery::Detailed { scheme, .. } => scheme.as_deref(),
            MediaQuery::Alias(query) if query.contains("light") => Some("light"),
            MediaQuery::Alias(query) if query.contains("dark") => Some("dark"),
            MediaQuery::Alias(_) => None,
        }
    }

    /// `color` or `display`.
    pub fn group(&self) -> &str {
        match self {
            MediaQuery::Detailed {
                group: Some(group), ..
            } => group,
            _ if self.scheme().is_some() => "color",
            _ => "display",
        }
    }

    /// True for queries that select by class/id/attribute (`[dark]`).
    pub fn is_custom(&self) -> bool {
        self.query().contains('[')
    }
}

/// An `extends`/`includes` entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalRef {
    Url(String),
    Detailed {
        url: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        excludes: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        only: Vec<String>,
    },
}

impl ExternalRef {
    pub fn url(&self) -> &str {
        match self {
            ExternalRef::Url(url) => url,
            ExternalRef::Detailed { url, .. } => url,
        }
    }

    pub fn filter(&self) -> EdgeFilter {
        match self {
            ExternalRef::Url(_) => EdgeFilter::default(),
            ExternalRef::Detailed { excludes, only, .. } => EdgeFilter::new(excludes, only),
        }
    }
}

/// Which section of a document a filter entry applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Tokens,
    Designs,
    Animations,
}

impl Section {
    fn prefix(self) -> &'static str {
        match self {
            Section::Tokens => "tokens.",
            Section::Designs => "designs.",
            Section::Animations => "animations.",
        }
    }
}

/// `excludes`/`only` of one graph edge.
///
/// Entries are JSON-pointer-like (`/tokens/color` or `tokens.color`). An entry
/// prefixed with a section name applies to that section only; a bare entry
/// applies to every section. Token entries match the path and everything
/// below it; design and animation entries match by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeFilter {
    pub excludes: Vec<String>,
    pub only: Vec<String>,
}

impl EdgeFilter {
    pub fn new(excludes: &[String], only: &[String]) -> Self {
        let normalize = |entry: &String| entry.trim_start_matches('/').replace('/', ".");
        Self {
            excludes: excludes.iter().map(normalize).collect(),
            only: only.iter().map(normalize).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.excludes.is_empty() && self.only.is_empty()
    }

    pub fn allows(&self, section: Section, key: &str) -> bool {
        let matches = |entry: &String| match scoped(entry, section) {
            Some(e) if !e.is_empty() => {
                key == e
                    || (section == Section::Tokens
                        && key.strip_prefix(e).is_some_and(|rest| rest.starts_with('.')))
            }
            _ => false,
        };

        if self.excludes.iter().any(matches) {
            return false;
        }

        let mut applicable = self
            .only
            .iter()
            .filter(|entry| scoped(entry, section).is_some())
            .peekable();

        applicable.peek().is_none() || applicable.any(matches)
    }
}

/// The part of a filter entry that applies to `section`, if any.
fn scoped(entry: &str, section: Section) -> Option<&str> {
    if let Some(rest) = entry.strip_prefix(section.prefix()) {
        return Some(rest);
    }

    let other_section = [Section::Tokens, Section::Designs, Section::Animations]
        .iter()
        .any(|s| entry.starts_with(s.prefix()));

    if other_section { None } else { Some(entry) }
}

/// A design document.
///
/// The `Option` fields are override-eligible: a document that leaves one
/// unset inherits it from the first extended or included document that sets
/// it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub designs: Vec<Design>,
    #[serde(default)]
    pub animations: Vec<Animation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<Mixin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub font_faces: Vec<FontFace>,

    /// Default layer for this document's designs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<ExternalRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<ExternalRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imports: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_queries: Option<IndexMap<String, MediaQuery>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_color_scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_query_mode: Option<QueryMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_tokens: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_tokens: Option<Vec<String>>,
}

impl DesignSpec {
    /// Fills every unset override-eligible field from `other`.
    ///
    /// Returns the names of the fields that were taken.
    pub fn inherit_overrides(&mut self, other: &DesignSpec) -> Vec<&'static str> {
        let mut taken = Vec::new();

        macro_rules! inherit {
            ($($field:ident => $key:literal),* $(,)?) => {
                $(
                    if self.$field.is_none() && other.$field.is_some() {
                        self.$field = other.$field.clone();
                        taken.push($key);
                    }
                )*
            };
        }

        inherit!(
            layers => "layers",
            imports => "imports",
            media_queries => "mediaQueries",
            default_color_scheme => "defaultColorScheme",
            custom_query_mode => "customQueryMode",
            root_scope => "rootScope",
            variable_prefix => "variablePrefix",
            exclude_tokens => "excludeTokens",
            include_tokens => "includeTokens",
        );

        taken
    }

    /// A copy holding only the override-eligible fields.
    pub fn overrides(&self) -> DesignSpec {
        let mut copy = DesignSpec::default();
        copy.inherit_overrides(self);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_ref_forms() {
        let refs: Vec<ExternalRef> = serde_json::from_str(
            r#"["./base.json", {"url": "./theme.json", "excludes": ["/tokens/color"]}]"#,
        )
        .unwrap();

        assert_eq!(refs[0].url(), "./base.json");
        assert!(refs[0].filter().is_empty());
        assert_eq!(refs[1].url(), "./theme.json");
        assert_eq!(refs[1].filter().excludes, vec!["tokens.color"]);
    }

    #[test]
    fn test_filter_excludes_token_subtree() {
        let filter = EdgeFilter::new(&["/tokens/color".to_string()], &[]);

        assert!(!filter.allows(Section::Tokens, "color"));
        assert!(!filter.allows(Section::Tokens, "color.primary"));
        assert!(filter.allows(Section::Tokens, "colors"));
        assert!(filter.allows(Section::Designs, "color"));
    }

    #[test]
    fn test_filter_only() {
        let filter = EdgeFilter::new(&[], &["designs.btn".to_string()]);

        assert!(filter.allows(Section::Designs, "btn"));
        assert!(!filter.allows(Section::Designs, "card"));
        // No token entry in `only`, so tokens pass.
        assert!(filter.allows(Section::Tokens, "color"));
    }

    #[test]
    fn test_bare_filter_applies_everywhere() {
        let filter = EdgeFilter::new(&["spin".to_string()], &[]);

        assert!(!filter.allows(Section::Animations, "spin"));
        assert!(!filter.allows(Section::Designs, "spin"));
        assert!(!filter.allows(Section::Tokens, "spin.fast"));
    }

    #[test]
    fn test_inherit_overrides_keeps_own_values() {
        let mut own = DesignSpec {
            root_scope: Some(".app".into()),
            ..Default::default()
        };
        let parent = DesignSpec {
            root_scope: Some(".parent".into()),
            variable_prefix: Some("tq".into()),
            ..Default::default()
        };

        let taken = own.inherit_overrides(&parent);

        assert_eq!(own.root_scope.as_deref(), Some(".app"));
        assert_eq!(own.variable_prefix.as_deref(), Some("tq"));
        assert_eq!(taken, vec!["variablePrefix"]);
    }

    #[test]
    fn test_media_query_scheme() {
        let alias = MediaQuery::Alias("[dark]".into());
        assert_eq!(alias.scheme(), Some("dark"));
        assert_eq!(alias.group(), "color");
        assert!(alias.is_custom());

        let wide = MediaQuery::Alias("(min-width: 1920px)".into());
        assert_eq!(wide.scheme(), None);
        assert_eq!(wide.group(), "display");
    }
}
