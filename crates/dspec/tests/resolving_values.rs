use dspec::maps::build_maps;
use dspec::parser::parse_document;
use dspec::resolve::Resolver;
use dspec::types::TokenType;
use dspec::SpecError;

const THEME: &str = r##"{
    "name": "theme",
    "tokens": [
        { "name": "color", "type": "color", "value": { "@": "#336699", "@dark": "#112233" },
          "tokens": [
            { "name": "muted", "value": "&this!40" },
            { "name": "link", "value": "@color" },
            { "name": "link-soft", "value": "$color.link<10" }
          ] },
        { "name": "size", "type": "unit", "value": "16px",
          "tokens": [
            { "name": "double", "value": "&this-2x" },
            { "name": "lg", "value": "&this(*1.5)" },
            { "name": "broken", "value": "$size!20" }
          ] },
        { "name": "weight", "type": "number", "value": 600 },
        { "name": "dense", "type": "boolean", "value": "@size" }
    ]
}"##;

fn resolve(raw: &str, kind: TokenType, inline: bool) -> dspec::Result<String> {
    let doc = parse_document(THEME, false).unwrap();
    let maps = build_maps(&doc.spec, &doc.locations, None);
    Resolver::new(&maps.tokens, Some("tq")).resolve(raw, "prop", kind, inline)
}

// ==================== TOKEN VALUE TESTS ====================

#[test]
fn test_token_values_resolve_in_place() {
    let doc = parse_document(THEME, false).unwrap();
    let maps = build_maps(&doc.spec, &doc.locations, None);
    let resolver = Resolver::new(&maps.tokens, None);

    let resolved = |path: &str| {
        let token = &maps.tokens[path];
        resolver.resolve(&token.value, path, token.kind, false)
    };

    assert_eq!(resolved("color").unwrap(), "#336699");
    assert_eq!(resolved("color.muted").unwrap(), "rgba(51, 102, 153, 0.4)");
    assert_eq!(resolved("color.link").unwrap(), "var(--color)");
    assert_eq!(resolved("color.link-soft").unwrap(), "#2e5c8a");
    assert_eq!(resolved("size.lg").unwrap(), "24px");
}

#[test]
fn test_inherited_value_keeps_suffix() {
    let doc = parse_document(THEME, false).unwrap();
    let maps = build_maps(&doc.spec, &doc.locations, None);
    assert_eq!(maps.tokens["size.double"].value, "16px-2x");
}

#[test]
fn test_token_locations_point_at_values() {
    let doc = parse_document(THEME, false).unwrap();
    let maps = build_maps(&doc.spec, &doc.locations, None);

    let location = maps.tokens["color.@dark"].location.unwrap();
    assert_eq!(location.line, 4);
    assert_eq!(maps.tokens["color.@dark"].pointer, "tokens.0.value.@dark");
}

// ==================== RULE VALUE TESTS ====================

#[test]
fn test_rule_values() {
    assert_eq!(
        resolve("0 0 4px $color!50", TokenType::Any, false).unwrap(),
        "0 0 4px rgba(51, 102, 153, 0.5)"
    );
    assert_eq!(
        resolve("@size.lg|2rem", TokenType::Any, false).unwrap(),
        "var(--tq-size-lg, 2rem)"
    );
    assert_eq!(resolve("@size.lg", TokenType::Unit, true).unwrap(), "24px");
    assert_eq!(
        resolve("calc(@size * 2)", TokenType::Unit, false).unwrap(),
        "calc(var(--tq-size) * 2)"
    );
}

// ==================== FAILURE TESTS ====================

#[test]
fn test_transform_result_is_validated() {
    let err = resolve("$size.broken", TokenType::Color, false).unwrap_err();
    match err {
        SpecError::Validation { value, kind, .. } => {
            assert_eq!(value, "16px");
            assert_eq!(kind, TokenType::Color);
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn test_inlined_reference_is_validated() {
    let err = resolve("@dense", TokenType::Boolean, true).unwrap_err();
    assert!(matches!(err, SpecError::Validation { .. }));
    assert!(resolve("@dense", TokenType::Boolean, false).is_ok());
}

#[test]
fn test_missing_copy_reports_expression() {
    let err = resolve("1px solid $border.color", TokenType::Any, false).unwrap_err();
    assert_eq!(
        err.to_string(),
        "can not find the token value of \"$border.color\""
    );
}
