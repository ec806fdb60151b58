use dspec::maps::build_maps;
use dspec::parser::parse_document;
use dspec::types::{DesignKind, RuleValue};

fn selectors(json: &str) -> Vec<String> {
    let doc = parse_document(json, false).unwrap();
    build_maps(&doc.spec, &doc.locations, None)
        .designs
        .keys()
        .cloned()
        .collect()
}

// ==================== PSEUDO STATE TESTS ====================

#[test]
fn test_every_base_selector_gets_two_state_selectors() {
    let keys = selectors(
        r#"{"name": "x", "designs": [
            {"name": "btn", "selectors": [".btn", "button"], "rules": {"::hover": {"color": "red"}}}
        ]}"#,
    );

    assert_eq!(keys, vec![".btn:hover, button:hover", ".btn.hover, button.hover"]);
}

#[test]
fn test_states_are_grouped_per_pseudo_name() {
    let doc = parse_document(
        r#"{"name": "x", "designs": [{"name": "input", "rules": {
            "color": {"@": "black", ":focus": "blue", ":disabled": "gray"},
            "border-color": {":focus": "blue"},
            "content": {"::placeholder": "none"}
        }}]}"#,
        true,
    )
    .unwrap();
    let maps = build_maps(&doc.spec, &doc.locations, None);

    let keys: Vec<&String> = maps.designs.keys().collect();
    assert_eq!(
        keys,
        vec![
            ".input",
            ".input:focus",
            ".input.focus",
            ".input:disabled",
            ".input.disabled",
            ".input::placeholder",
        ]
    );

    let focus = &maps.designs[".input:focus"];
    assert_eq!(focus.kind, DesignKind::PseudoClass);
    assert_eq!(maps.designs[".input.focus"].kind, DesignKind::PseudoState);
    assert_eq!(focus.rules.len(), 2);
    assert_eq!(focus.rules["border-color"], RuleValue::from("blue"));
    assert_eq!(maps.designs[".input::placeholder"].kind, DesignKind::PseudoElement);
}

// ==================== NESTING TESTS ====================

#[test]
fn test_nested_children_and_variants() {
    let keys = selectors(
        r#"{"name": "x", "designs": [{"name": "card", "rules": {"padding": "4px"},
            "children": [{"name": "title", "rules": {"margin": "0"},
                          "variants": [{"name": "large", "rules": {"font-size": "2rem"}}]}],
            "variants": [{"name": "[data-open]", "rules": {"display": "block"}}]}]}"#,
    );

    insta::assert_snapshot!(keys.join("\n"), @r"
    .card
    .card[data-open]
    .card .title
    .card .title.large
    ");
}

#[test]
fn test_design_pointers_and_locations() {
    let doc = parse_document(
        "{\n  \"name\": \"x\",\n  \"designs\": [\n    {\"name\": \"a\", \"rules\": {\"color\": \"red\"}}\n  ]\n}",
        false,
    )
    .unwrap();
    let maps = build_maps(&doc.spec, &doc.locations, None);

    let design = &maps.designs[".a"];
    assert_eq!(design.pointer, "designs.0");
    assert_eq!(design.location.map(|l| l.line), Some(4));
}
