//! Selector composition.
//!
//! Children join their parent's selectors with a space (or ` > `), variants
//! concatenate onto them, and top-level selectors are prefixed with the
//! document's root scope.

use crate::types::design::DesignKind;

/// Pseudo-classes that also get a same-named state class (`.hover`).
pub const PSEUDO_STATES: &[&str] = &[
    "hover",
    "focus",
    "disabled",
    "active",
    "visited",
    "checked",
    "default",
    "indeterminate",
];

/// Pseudo-elements, written with `::`.
pub const PSEUDO_ELEMENTS: &[&str] = &["before", "after", "selection", "placeholder", "marker"];

/// One selector synthesized from a `:name` rule key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PseudoVariant {
    pub selector: String,
    pub kind: DesignKind,
}

impl PseudoVariant {
    fn new(selector: String, kind: DesignKind) -> Self {
        Self { selector, kind }
    }
}

/// Expands a pseudo rule key (`:hover`, `::before`) into variant selectors.
///
/// Interactive states yield the pseudo-class and a state class, pseudo
/// elements yield `::name`, vendor and unknown names yield `:name`.
///
/// ```rust
/// use dspec::parser::selectors::pseudo_variants;
///
/// let selectors: Vec<String> = pseudo_variants("::hover")
///     .into_iter()
///     .map(|v| v.selector)
///     .collect();
/// assert_eq!(selectors, vec![":hover", ".hover"]);
/// ```
pub fn pseudo_variants(key: &str) -> Vec<PseudoVariant> {
    let name = key.trim_start_matches(':');

    if PSEUDO_STATES.contains(&name) {
        vec![
            PseudoVariant::new(format!(":{name}"), DesignKind::PseudoClass),
            PseudoVariant::new(format!(".{name}"), DesignKind::PseudoState),
        ]
    } else if PSEUDO_ELEMENTS.contains(&name) {
        vec![PseudoVariant::new(format!("::{name}"), DesignKind::PseudoElement)]
    } else if name.starts_with('-') {
        vec![PseudoVariant::new(format!(":{name}"), DesignKind::PseudoState)]
    } else {
        vec![PseudoVariant::new(format!(":{name}"), DesignKind::Pseudo)]
    }
}

/// Joins every child selector onto every parent selector, child-major.
pub fn join_selectors(children: &[String], parents: &[String], separator: &str) -> Vec<String> {
    children
        .iter()
        .flat_map(|child| {
            parents
                .iter()
                .map(move |parent| format!("{parent}{separator}{child}"))
        })
        .collect()
}

/// Variant names starting with a letter are class names.
pub fn variant_selector(name: &str) -> String {
    if name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        format!(".{name}")
    } else {
        name.to_string()
    }
}

/// Applies the root scope to a top-level design's selectors.
///
/// `root` designs become the scope itself (`:root` without one); `important`
/// designs and unscoped documents keep their selectors.
pub fn scope_selectors(
    selectors: &[String],
    scope: Option<&str>,
    root: bool,
    important: bool,
) -> Vec<String> {
    if root {
        return vec![scope.unwrap_or(":root").to_string()];
    }

    match scope {
        Some(scope) if !important => selectors.iter().map(|s| format!("{scope} {s}")).collect(),
        _ => selectors.to_vec(),
    }
}

/// Splits a joined selector string.
pub fn split_selectors(selectors: &str) -> Vec<String> {
    selectors
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
