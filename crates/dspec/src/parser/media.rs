//! Media query aliases and custom query expansion.
//!
//! Rule and token values can be scoped by query keys such as `@dark` or
//! `@md@dark`. A [`MediaQueryTable`] translates each alias into a real media
//! condition. Aliases whose condition contains a bracketed token (`[dark]`)
//! are *custom* queries: instead of an `@media` wrapper they select by a
//! class, id or attribute on an ancestor element.
//!
//! ```rust
//! use dspec::parser::media::MediaQueryTable;
//!
//! let table = MediaQueryTable::new();
//! assert_eq!(table.translate("@dark"), "(prefers-color-scheme: dark)");
//! assert_eq!(
//!     table.translate("@md@dark"),
//!     "(min-width: 768px) and (max-width: 1023px) and (prefers-color-scheme: dark)"
//! );
//! ```

use indexmap::IndexMap;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::spec::{MediaQuery, QueryMode};

static CUSTOM_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[\w-]+\]").expect("valid custom query pattern"));

const BUILTIN_QUERIES: &[(&str, &str)] = &[
    ("@light", "(prefers-color-scheme: light)"),
    ("@dark", "(prefers-color-scheme: dark)"),
    ("@sm", "(max-width: 767px)"),
    ("@md", "(min-width: 768px) and (max-width: 1023px)"),
    ("@lg", "(min-width: 1024px)"),
    ("@xl", "(min-width: 1440px)"),
    ("@print", "print"),
];

/// Where a query-scoped declaration lands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryTarget {
    /// `@media …` wrapper, if any condition remains.
    pub media: Option<String>,
    /// Selector replacing the current scope, for custom queries.
    pub selector: Option<String>,
}

/// Alias table: the built-in aliases plus document and option overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaQueryTable {
    entries: IndexMap<String, MediaQuery>,
}

impl Default for MediaQueryTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaQueryTable {
    /// A table holding only the built-in aliases.
    pub fn new() -> Self {
        let entries = BUILTIN_QUERIES
            .iter()
            .map(|(name, query)| (name.to_string(), MediaQuery::Alias(query.to_string())))
            .collect();
        Self { entries }
    }

    /// Adds or replaces aliases. Names without a leading `@` get one.
    pub fn extend<'a>(&mut self, queries: impl IntoIterator<Item = (&'a String, &'a MediaQuery)>) {
        for (name, query) in queries {
            let name = if name.starts_with('@') {
                name.clone()
            } else {
                format!("@{name}")
            };
            self.entries.insert(name, query.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&MediaQuery> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MediaQuery)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Translates a query key (`@md@dark`) into a media condition.
    ///
    /// Unknown aliases are passed through without their `@` and logged.
    pub fn translate(&self, key: &str) -> String {
        key.trim_start_matches('@')
            .split('@')
            .map(|part| match self.entries.get(&format!("@{part}")) {
                Some(query) => query.query().to_string(),
                None => {
                    warn!("The media query \"@{}\" is not supported.", part);
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" and ")
    }

    /// Resolves a query key against the selectors currently in scope.
    ///
    /// `scope` is the comma separated selector list the declaration belongs
    /// to; `:root` means document level.
    pub fn target(&self, key: &str, mode: QueryMode, scope: &str) -> QueryTarget {
        let query = self.translate(key);
        let customs: Vec<&str> = CUSTOM_QUERY.find_iter(&query).map(|m| m.as_str()).collect();

        if customs.is_empty() {
            return QueryTarget {
                media: Some(format!("@media {query}")),
                selector: None,
            };
        }

        let mut custom = custom_selector(&customs.concat(), mode);
        let mut remainder = query.clone();
        for c in &customs {
            remainder = remainder
                .replace(&format!(" and {c}"), "")
                .replace(&format!("{c} and "), "")
                .replace(c, "");
        }
        let remainder = remainder.trim();

        if scope != ":root" {
            custom = scope
                .split(',')
                .map(|s| format!("{custom} {}", s.trim()))
                .collect::<Vec<_>>()
                .join(", ");
        }

        QueryTarget {
            media: (!remainder.is_empty()).then(|| format!("@media {remainder}")),
            selector: Some(custom),
        }
    }

    /// Selectors carrying `color-scheme` for custom light/dark queries.
    pub fn color_schemes(&self, mode: QueryMode) -> Vec<(String, String)> {
        self.entries
            .values()
            .filter(|query| query.is_custom() && query.group() == "color")
            .filter_map(|query| {
                let scheme = query.scheme()?;
                let selector = custom_selector(query.query(), mode);
                Some((selector, scheme.to_string()))
            })
            .collect()
    }
}

/// Rewrites bracketed tokens for the configured query mode.
pub fn custom_selector(query: &str, mode: QueryMode) -> String {
    match mode {
        QueryMode::Class => query.replace('[', ".").replace(']', ""),
        QueryMode::Id => query.replace('[', "#").replace(']', ""),
        QueryMode::Attribute => query.to_string(),
    }
}
