//! Flattened lookup maps.
//!
//! The token, design and animation trees of a document are flattened into
//! path-keyed maps:
//!
//! - [`tokens`]: `color.primary`, `color.primary.@dark`
//! - [`designs`]: joined selector strings such as `.app .btn:hover`
//! - [`animations`]: namespaced keyframe names such as `fade-in`
//!
//! Maps of several documents combine with the `merge_*` functions, filtered
//! by the [`EdgeFilter`]s of the edges they were reached through.

pub mod animations;
pub mod designs;
pub mod tokens;

pub use crate::maps::animations::build_animation_map;
pub use crate::maps::designs::{build_design_map, parse_design_rules};
pub use crate::maps::tokens::build_token_map;

use log::info;

use crate::types::{
    AnimationMap, DesignMap, DesignSpec, EdgeFilter, LocationMap, Section, TokenMap, merge_rules,
};

/// The three maps of one document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentMaps {
    pub tokens: TokenMap,
    pub designs: DesignMap,
    pub animations: AnimationMap,
}

/// Builds all maps of a standalone document, scoped by its own `rootScope`.
pub fn build_maps(spec: &DesignSpec, locations: &LocationMap, url: Option<&str>) -> DocumentMaps {
    let tokens = build_token_map(&spec.tokens, locations);
    let designs = build_design_map(spec, locations, spec.root_scope.as_deref(), &tokens);
    let animations = build_animation_map(&spec.animations, locations, url);

    DocumentMaps {
        tokens,
        designs,
        animations,
    }
}

/// Adds `source` tokens to `target`; later entries win.
pub fn merge_token_maps(target: &mut TokenMap, source: &TokenMap, filters: &[EdgeFilter]) {
    for (path, token) in source {
        if !allowed(filters, Section::Tokens, path) {
            info!("Skipping token \"{}\" due to an edge filter", path);
            continue;
        }
        target.insert(path.clone(), token.clone());
    }
}

/// Adds `source` designs to `target`, merging rules of shared selectors.
pub fn merge_design_maps(target: &mut DesignMap, source: &DesignMap, filters: &[EdgeFilter]) {
    for (selector, design) in source {
        if !allowed(filters, Section::Designs, &design.name) {
            continue;
        }
        match target.get_mut(selector) {
            Some(existing) => merge_rules(&mut existing.rules, &design.rules),
            None => {
                target.insert(selector.clone(), design.clone());
            }
        }
    }
}

/// Adds `source` animations to `target`, merging frames of shared names.
pub fn merge_animation_maps(
    target: &mut AnimationMap,
    source: &AnimationMap,
    filters: &[EdgeFilter],
) {
    for (name, animation) in source {
        if !allowed(filters, Section::Animations, name) {
            continue;
        }
        match target.get_mut(name) {
            Some(existing) => {
                for (frame, rules) in &animation.frames {
                    merge_rules(existing.frames.entry(frame.clone()).or_default(), rules);
                }
            }
            None => {
                target.insert(name.clone(), animation.clone());
            }
        }
    }
}

/// True when every filter on the path lets `key` through.
pub fn allowed(filters: &[EdgeFilter], section: Section, key: &str) -> bool {
    filters.iter().all(|filter| filter.allows(section, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    fn maps(json: &str) -> DocumentMaps {
        let doc = parse_document(json, true).unwrap();
        build_maps(&doc.spec, &doc.locations, None)
    }

    #[test]
    fn test_merge_tokens_last_write_wins() {
        let mut target = maps(r#"{"tokens": [{"name": "a", "value": "1"}, {"name": "b", "value": "2"}]}"#).tokens;
        let source = maps(r#"{"tokens": [{"name": "a", "value": "9"}]}"#).tokens;

        merge_token_maps(&mut target, &source, &[]);

        assert_eq!(target["a"].value, "9");
        assert_eq!(target["b"].value, "2");
    }

    #[test]
    fn test_merge_tokens_respects_filter() {
        let mut target = TokenMap::new();
        let source = maps(
            r##"{"tokens": [{"name": "color", "tokens": [{"name": "x", "value": "#fff"}]},
                           {"name": "size", "value": "1px"}]}"##,
        )
        .tokens;

        let filter = EdgeFilter::new(&["/tokens/color".to_string()], &[]);
        merge_token_maps(&mut target, &source, &[filter]);

        let keys: Vec<&String> = target.keys().collect();
        assert_eq!(keys, vec!["size"]);
    }

    #[test]
    fn test_merge_designs_is_key_additive() {
        let mut target = maps(r#"{"designs": [{"name": "btn", "rules": {"color": "red"}}]}"#).designs;
        let source = maps(r#"{"designs": [{"name": "btn", "rules": {"margin": "0"}}]}"#).designs;

        merge_design_maps(&mut target, &source, &[]);

        let rules: Vec<&String> = target[".btn"].rules.keys().collect();
        assert_eq!(rules, vec!["color", "margin"]);
    }

    #[test]
    fn test_merge_designs_only_filter() {
        let mut target = DesignMap::new();
        let source = maps(
            r#"{"designs": [{"name": "btn", "rules": {"color": "red"}},
                            {"name": "card", "rules": {"color": "blue"}}]}"#,
        )
        .designs;

        let filter = EdgeFilter::new(&[], &["designs.card".to_string()]);
        merge_design_maps(&mut target, &source, &[filter]);

        assert_eq!(target.len(), 1);
        assert!(target.contains_key(".card"));
    }
}
