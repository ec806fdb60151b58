//! Token tree flattening.
//!
//! Every token becomes one [`TokenRef`] per default or query value. Children
//! extend the parent's path and inherit its declared type and tags.

use log::warn;

use crate::types::location::child_path;
use crate::types::{LocationMap, Scalar, Token, TokenMap, TokenRef, TokenType, TokenValue};

/// The inheritance marker for a parent's own value.
pub const THIS_MARKER: &str = "&this";

struct Parent<'a> {
    path: &'a str,
    kind: TokenType,
    tags: &'a [String],
    value: Option<&'a str>,
}

/// Flattens a token tree into a [`TokenMap`].
///
/// ```rust
/// use dspec::maps::tokens::build_token_map;
/// use dspec::types::{LocationMap, Token};
///
/// let tokens: Vec<Token> = serde_json::from_str(
///     r#"[{"name": "size", "type": "unit", "value": "16px",
///          "tokens": [{"name": "lg", "value": "&this(*2)"}]}]"#,
/// ).unwrap();
///
/// let map = build_token_map(&tokens, &LocationMap::new());
/// assert_eq!(map["size.lg"].value, "16px(*2)");
/// assert_eq!(map["size.lg"].kind.to_string(), "unit");
/// ```
pub fn build_token_map(tokens: &[Token], locations: &LocationMap) -> TokenMap {
    let mut map = TokenMap::new();
    for (i, token) in tokens.iter().enumerate() {
        flatten(token, None, &format!("tokens.{i}"), locations, &mut map);
    }
    map
}

fn flatten(
    token: &Token,
    parent: Option<&Parent<'_>>,
    pointer: &str,
    locations: &LocationMap,
    map: &mut TokenMap,
) {
    let path = match parent {
        Some(p) => child_path(p.path, &token.name),
        None => token.name.clone(),
    };
    let kind = token
        .kind
        .or(parent.map(|p| p.kind))
        .unwrap_or_default();
    let tags = if token.tags.is_empty() {
        parent.map(|p| p.tags.to_vec()).unwrap_or_default()
    } else {
        token.tags.clone()
    };

    let entry = |path: String, value: &Scalar, pointer: String| TokenRef {
        value: inherit(&value.to_string(), parent, &path),
        path,
        kind,
        tags: tags.clone(),
        url: token.url.clone(),
        location: locations.get(&pointer),
        pointer,
    };

    let value_pointer = format!("{pointer}.value");
    match &token.value {
        Some(TokenValue::Scalar(value)) => {
            map.insert(path.clone(), entry(path.clone(), value, value_pointer));
        }
        Some(TokenValue::Scoped(values)) => {
            for (key, value) in values {
                let key_path = if key == "@" || key == "." {
                    path.clone()
                } else {
                    format!("{path}.{key}")
                };
                let key_pointer = format!("{value_pointer}.{key}");
                map.insert(key_path.clone(), entry(key_path, value, key_pointer));
            }
        }
        None => {}
    }

    let own_value = map.get(&path).map(|t| t.value.clone());
    let this = Parent {
        path: &path,
        kind,
        tags: &tags,
        value: own_value.as_deref(),
    };
    for (i, child) in token.tokens.iter().enumerate() {
        flatten(child, Some(&this), &format!("{pointer}.tokens.{i}"), locations, map);
    }
}

/// Replaces a leading `&this` with the parent's value.
///
/// A parent reference (`@x`) is inherited as a copy (`$x`) so transforms in
/// the remainder apply to its value.
fn inherit(value: &str, parent: Option<&Parent<'_>>, path: &str) -> String {
    let Some(rest) = value.strip_prefix(THIS_MARKER) else {
        return value.to_string();
    };

    match parent.and_then(|p| p.value) {
        Some(parent_value) => match parent_value.strip_prefix('@') {
            Some(reference) => format!("${reference}{rest}"),
            None => format!("{parent_value}{rest}"),
        },
        None => {
            warn!(
                "The token \"{}\" uses {} but its parent has no value",
                path, THIS_MARKER
            );
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(json: &str) -> TokenMap {
        let tokens: Vec<Token> = serde_json::from_str(json).unwrap();
        build_token_map(&tokens, &LocationMap::new())
    }

    #[test]
    fn test_scoped_values() {
        let map = tokens(
            r##"[{"name": "color", "type": "color", "value": {"@": "#336699", "@dark": "#112233"}}]"##,
        );

        assert_eq!(map.len(), 2);
        assert_eq!(map["color"].value, "#336699");
        assert_eq!(map["color"].pointer, "tokens.0.value.@");
        assert_eq!(map["color.@dark"].value, "#112233");
        assert_eq!(map["color.@dark"].kind, TokenType::Color);
    }

    #[test]
    fn test_children_inherit_type_and_tags() {
        let map = tokens(
            r#"[{"name": "space", "type": "unit", "tags": ["layout"],
                 "tokens": [{"name": "sm", "value": "4px"},
                            {"name": "flag", "type": "boolean", "value": true}]}]"#,
        );

        assert!(!map.contains_key("space"));
        assert_eq!(map["space.sm"].kind, TokenType::Unit);
        assert_eq!(map["space.sm"].tags, vec!["layout"]);
        assert_eq!(map["space.sm"].pointer, "tokens.0.tokens.0.value");
        assert_eq!(map["space.flag"].kind, TokenType::Boolean);
        assert_eq!(map["space.flag"].value, "true");
    }

    #[test]
    fn test_this_inherits_parent_value() {
        let map = tokens(
            r#"[{"name": "size", "value": "16px", "tokens": [{"name": "double", "value": "&this-2x"}]}]"#,
        );
        assert_eq!(map["size.double"].value, "16px-2x");
    }

    #[test]
    fn test_this_rewrites_parent_reference_to_copy() {
        let map = tokens(
            r#"[{"name": "hover", "value": "@color.primary",
                 "tokens": [{"name": "soft", "value": "&this!40"}]}]"#,
        );
        assert_eq!(map["hover.soft"].value, "$color.primary!40");
    }

    #[test]
    fn test_this_without_parent_value_is_kept() {
        let map = tokens(r#"[{"name": "a", "tokens": [{"name": "b", "value": "&this-x"}]}]"#);
        assert_eq!(map["a.b"].value, "&this-x");
    }

    #[test]
    fn test_numbers_keep_json_form() {
        let map = tokens(r#"[{"name": "z", "type": "number", "value": 10}]"#);
        assert_eq!(map["z"].value, "10");
    }
}
