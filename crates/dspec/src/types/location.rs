//! Source positions of values inside a parsed document.

use indexmap::IndexMap;

/// A position in a document: 1-based line, 0-based column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Maps a logical JSON path (`tokens.2.value`) to the position of its value.
///
/// Paths join object keys and array indexes with `.`; the document root is
/// the empty path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocationMap {
    entries: IndexMap<String, SourceLocation>,
}

impl LocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, location: SourceLocation) {
        self.entries.insert(path.into(), location);
    }

    pub fn get(&self, path: &str) -> Option<SourceLocation> {
        self.entries.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SourceLocation)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Joins a parent path and a child key the way [`LocationMap`] keys are built.
pub fn child_path(parent: &str, key: impl std::fmt::Display) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}
