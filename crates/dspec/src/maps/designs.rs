//! Design tree flattening.
//!
//! Each design contributes one [`DesignRef`] per selector group: its own
//! rules, its declared variants, one group per pseudo state found in its
//! rules, and its children. Entries landing on the same selector string are
//! merged key by key.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::selectors::{
    join_selectors, pseudo_variants, scope_selectors, variant_selector,
};
use crate::types::{
    Design, DesignMap, DesignRef, DesignSpec, LocationMap, Mixin, RuleMap, RuleValue, TokenMap,
    merge_rules,
};

static THIS_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@this\b").expect("valid placeholder pattern"));

/// Where a design sits relative to the selectors already mapped.
#[derive(Clone, Copy)]
enum Placement<'a> {
    TopLevel,
    Variant(&'a [String]),
    Child(&'a [String], &'static str),
}

struct Context<'a> {
    scope: Option<&'a str>,
    locations: &'a LocationMap,
    root_name: &'a str,
}

/// Flattens a document's designs and mixins.
///
/// `scope` is the document's effective root scope. `tokens` is used to
/// select mixin targets.
pub fn build_design_map(
    spec: &DesignSpec,
    locations: &LocationMap,
    scope: Option<&str>,
    tokens: &TokenMap,
) -> DesignMap {
    let mut map = DesignMap::new();

    for (i, design) in spec.designs.iter().enumerate() {
        let ctx = Context {
            scope,
            locations,
            root_name: &design.name,
        };
        let layer = design.layer.clone().or_else(|| spec.layer.clone());
        map_design(design, Placement::TopLevel, &format!("designs.{i}"), layer, &ctx, &mut map);
    }

    for (i, mixin) in spec.mixins.iter().enumerate() {
        for design in expand_mixin(mixin, tokens) {
            let ctx = Context {
                scope,
                locations,
                root_name: &design.name,
            };
            let layer = design.layer.clone().or_else(|| spec.layer.clone());
            map_design(&design, Placement::TopLevel, &format!("mixins.{i}"), layer, &ctx, &mut map);
        }
    }

    map
}

fn map_design(
    design: &Design,
    placement: Placement<'_>,
    pointer: &str,
    layer: Option<String>,
    ctx: &Context<'_>,
    map: &mut DesignMap,
) {
    let selectors = match placement {
        Placement::TopLevel => scope_selectors(
            &design.own_selectors(),
            ctx.scope,
            design.root,
            design.important,
        ),
        Placement::Variant(parents) => {
            let own = design
                .selectors
                .clone()
                .unwrap_or_else(|| vec![variant_selector(&design.name)]);
            join_selectors(&own, parents, "")
        }
        Placement::Child(parents, separator) => {
            join_selectors(&design.own_selectors(), parents, separator)
        }
    };

    let mut rules = RuleMap::new();
    for (name, value) in &design.variables {
        let name = name.trim_start_matches("--");
        rules.insert(format!("--{name}"), value.clone());
    }
    merge_rules(&mut rules, &design.rules);
    let (own_rules, pseudo_rules) = parse_design_rules(&rules);

    if !own_rules.is_empty() {
        insert(
            map,
            DesignRef {
                name: ctx.root_name.to_string(),
                kind: design.kind,
                selectors: selectors.clone(),
                rules: own_rules,
                layer: layer.clone(),
                root: design.root,
                important: design.important,
                url: design.url.clone(),
                pointer: pointer.to_string(),
                location: ctx.locations.get(pointer),
            },
        );
    }

    for (i, variant) in design.variants.iter().enumerate() {
        let layer = variant.layer.clone().or_else(|| layer.clone());
        map_design(
            variant,
            Placement::Variant(&selectors),
            &format!("{pointer}.variants.{i}"),
            layer,
            ctx,
            map,
        );
    }

    for (key, rules) in pseudo_rules {
        for pseudo in pseudo_variants(&key) {
            let synthesized = Design {
                name: design.name.clone(),
                kind: pseudo.kind,
                selectors: Some(vec![pseudo.selector]),
                rules: rules.clone(),
                url: design.url.clone(),
                ..Default::default()
            };
            map_design(
                &synthesized,
                Placement::Variant(&selectors),
                &format!("{pointer}.rules"),
                layer.clone(),
                ctx,
                map,
            );
        }
    }

    let separator = if design.direct_children { " > " } else { " " };
    for (i, child) in design.children.iter().enumerate() {
        let layer = child.layer.clone().or_else(|| layer.clone());
        map_design(
            child,
            Placement::Child(&selectors, separator),
            &format!("{pointer}.children.{i}"),
            layer,
            ctx,
            map,
        );
    }
}

fn insert(map: &mut DesignMap, design: DesignRef) {
    let key = design.selectors.join(", ");
    match map.get_mut(&key) {
        Some(existing) => merge_rules(&mut existing.rules, &design.rules),
        None => {
            map.insert(key, design);
        }
    }
}

/// Separates a rule map into the design's own rules and per-pseudo rules.
///
/// Pseudo states are written either inside a property
/// (`{"color": {":hover": "red"}}`) or as a block
/// (`{":hover": {"color": "red"}}`). Query keys stay with the property.
///
/// ```rust
/// use dspec::maps::designs::parse_design_rules;
/// use dspec::types::RuleMap;
///
/// let rules: RuleMap = serde_json::from_str(
///     r#"{"color": {"@": "blue", "@dark": "navy", ":hover": "red"}, "margin": "0"}"#,
/// ).unwrap();
///
/// let (own, pseudo) = parse_design_rules(&rules);
/// assert_eq!(own.len(), 2);
/// assert_eq!(pseudo[":hover"]["color"].as_literal(), Some("red"));
/// ```
pub fn parse_design_rules(rules: &RuleMap) -> (RuleMap, IndexMap<String, RuleMap>) {
    let mut own = RuleMap::new();
    let mut pseudo: IndexMap<String, RuleMap> = IndexMap::new();

    for (property, value) in rules {
        match value {
            RuleValue::Scoped(block) if property.starts_with(':') => {
                merge_rules(pseudo.entry(property.clone()).or_default(), block);
            }
            RuleValue::Literal(_) => {
                own.insert(property.clone(), value.clone());
            }
            RuleValue::Scoped(scoped) => {
                let mut queries = RuleMap::new();
                for (key, inner) in scoped {
                    if key.starts_with(':') {
                        pseudo
                            .entry(key.clone())
                            .or_default()
                            .insert(property.clone(), inner.clone());
                    } else {
                        queries.insert(key.clone(), inner.clone());
                    }
                }
                if !queries.is_empty() {
                    merge_rules(&mut own, &RuleMap::from([(property.clone(), RuleValue::Scoped(queries))]));
                }
            }
        }
    }

    (own, pseudo)
}

/// Stamps out one design per selected token of a mixin.
pub fn expand_mixin(mixin: &Mixin, tokens: &TokenMap) -> Vec<Design> {
    let names: Vec<String> = if mixin.tokens.is_empty() {
        let prefix = format!("{}.", mixin.group);
        tokens
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('.'))
            .map(str::to_string)
            .collect()
    } else {
        mixin.tokens.clone()
    };

    names
        .iter()
        .map(|token| {
            let reference = format!("@{}.{}", mixin.group, token);
            substitute_design(&mixin.design, token, &reference)
        })
        .collect()
}

fn substitute_design(design: &Design, name: &str, reference: &str) -> Design {
    let key = |s: &str| THIS_PLACEHOLDER.replace_all(s, name).into_owned();

    Design {
        name: key(&design.name),
        selectors: design
            .selectors
            .as_ref()
            .map(|selectors| selectors.iter().map(|s| key(s)).collect()),
        rules: substitute_rules(&design.rules, name, reference),
        variables: substitute_rules(&design.variables, name, reference),
        variants: design
            .variants
            .iter()
            .map(|d| substitute_design(d, name, reference))
            .collect(),
        children: design
            .children
            .iter()
            .map(|d| substitute_design(d, name, reference))
            .collect(),
        ..design.clone()
    }
}

fn substitute_rules(rules: &RuleMap, name: &str, reference: &str) -> RuleMap {
    rules
        .iter()
        .map(|(key, value)| {
            let key = THIS_PLACEHOLDER.replace_all(key, name).into_owned();
            let value = match value {
                RuleValue::Literal(s) => RuleValue::Literal(
                    THIS_PLACEHOLDER.replace_all(s, reference).into_owned(),
                ),
                RuleValue::Scoped(inner) => {
                    RuleValue::Scoped(substitute_rules(inner, name, reference))
                }
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maps::tokens::build_token_map;
    use crate::parser::parse_document;
    use crate::types::DesignKind;

    fn designs(json: &str, scope: Option<&str>) -> DesignMap {
        let doc = parse_document(json, true).unwrap();
        let tokens = build_token_map(&doc.spec.tokens, &doc.locations);
        build_design_map(&doc.spec, &doc.locations, scope, &tokens)
    }

    fn keys(map: &DesignMap) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    // ==================== PSEUDO EXPANSION TESTS ====================

    #[test]
    fn test_pseudo_block_yields_state_and_class() {
        let map = designs(
            r#"{"designs": [{"name": "btn", "rules": {"::hover": {"color": "red"}}}]}"#,
            None,
        );

        assert_eq!(keys(&map), vec![".btn:hover", ".btn.hover"]);
        assert_eq!(map[".btn:hover"].rules["color"].as_literal(), Some("red"));
        assert_eq!(map[".btn:hover"].kind, DesignKind::PseudoClass);
        assert_eq!(map[".btn.hover"].kind, DesignKind::PseudoState);
        assert_eq!(map[".btn.hover"].rules["color"].as_literal(), Some("red"));
        assert_eq!(map[".btn.hover"].name, "btn");
    }

    #[test]
    fn test_pseudo_inside_property() {
        let map = designs(
            r#"{"designs": [{"name": "link", "rules": {
                "color": {"@": "blue", ":before": "gray"}}}]}"#,
            None,
        );

        assert_eq!(keys(&map), vec![".link", ".link::before"]);
        let own = &map[".link"].rules["color"];
        assert_eq!(own, &RuleValue::Scoped(RuleMap::from([("@".to_string(), "blue".into())])));
    }

    // ==================== SELECTOR TESTS ====================

    #[test]
    fn test_variants_and_children() {
        let map = designs(
            r#"{"designs": [{"name": "btn", "rules": {"padding": "4px"},
                "variants": [{"name": "primary", "rules": {"color": "white"}}],
                "children": [{"name": "icon", "rules": {"width": "1em"}}]},
               {"name": "list", "directChildren": true, "selectors": ["ul"],
                "children": [{"name": "item", "selectors": ["li"], "rules": {"margin": "0"}}]}]}"#,
            None,
        );

        assert_eq!(keys(&map), vec![".btn", ".btn.primary", ".btn .icon", "ul > li"]);
    }

    #[test]
    fn test_root_scope() {
        let map = designs(
            r#"{"designs": [
                {"name": "btn", "rules": {"color": "red"}},
                {"name": "base", "root": true, "rules": {"font-size": "16px"}},
                {"name": "reset", "important": true, "selectors": ["*"], "rules": {"margin": "0"}}]}"#,
            Some(".app"),
        );

        assert_eq!(keys(&map), vec![".app .btn", ".app", "*"]);
        assert!(map[".app"].root);
    }

    #[test]
    fn test_same_selector_merges_rules() {
        let map = designs(
            r#"{"designs": [
                {"name": "a", "selectors": [".x"], "rules": {"color": {"@": "red"}}},
                {"name": "b", "selectors": [".x"], "rules": {"color": {"@dark": "blue"}, "margin": "0"}}]}"#,
            None,
        );

        assert_eq!(map.len(), 1);
        let rules = &map[".x"].rules;
        assert_eq!(rules["margin"].as_literal(), Some("0"));
        match &rules["color"] {
            RuleValue::Scoped(scoped) => assert_eq!(scoped.len(), 2),
            other => panic!("expected scoped value, got {other:?}"),
        }
    }

    #[test]
    fn test_variables_become_custom_properties() {
        let map = designs(
            r#"{"designs": [{"name": "card", "variables": {"gap": "4px"}, "rules": {"padding": "~gap"}}]}"#,
            None,
        );

        let rules: Vec<&String> = map[".card"].rules.keys().collect();
        assert_eq!(rules, vec!["--gap", "padding"]);
    }

    #[test]
    fn test_layer_inherited_from_document() {
        let map = designs(
            r#"{"layer": "base", "designs": [{"name": "a", "rules": {"color": "red"},
                "children": [{"name": "b", "layer": "top", "rules": {"color": "blue"}}]}]}"#,
            None,
        );

        assert_eq!(map[".a"].layer.as_deref(), Some("base"));
        assert_eq!(map[".a .b"].layer.as_deref(), Some("top"));
    }

    // ==================== MIXIN TESTS ====================

    #[test]
    fn test_mixin_selects_direct_children() {
        let map = designs(
            r##"{"tokens": [{"name": "color", "tokens": [
                    {"name": "red", "value": {"@": "#f00", "@dark": "#900"}},
                    {"name": "blue", "value": "#00f"}]}],
                "mixins": [{"group": "color", "name": "text-@this",
                            "rules": {"color": "@this", "--@this-tone": "1"}}]}"##,
            None,
        );

        assert_eq!(keys(&map), vec![".text-red", ".text-blue"]);
        assert_eq!(map[".text-red"].rules["color"].as_literal(), Some("@color.red"));
        assert!(map[".text-blue"].rules.contains_key("--blue-tone"));
    }

    #[test]
    fn test_mixin_with_explicit_tokens() {
        let map = designs(
            r#"{"tokens": [{"name": "space", "tokens": [{"name": "sm", "value": "4px"}, {"name": "lg", "value": "8px"}]}],
                "mixins": [{"group": "space", "tokens": ["lg"], "name": "gap-@this",
                            "rules": {"gap": "@this"}}]}"#,
            None,
        );

        assert_eq!(keys(&map), vec![".gap-lg"]);
        assert_eq!(map[".gap-lg"].rules["gap"].as_literal(), Some("@space.lg"));
    }
}
