//! Value expression evaluation.
//!
//! A [`Resolver`] evaluates the segments produced by
//! [`Expression::parse`](crate::parser::Expression::parse) against a token
//! map and validates the final literal against the declared token type.
//!
//! ```rust
//! use dspec::maps::build_token_map;
//! use dspec::resolve::Resolver;
//! use dspec::types::{LocationMap, Token, TokenType};
//!
//! let tokens: Vec<Token> = serde_json::from_str(
//!     r##"[{"name": "color", "type": "color", "value": "#336699"}]"##,
//! ).unwrap();
//! let map = build_token_map(&tokens, &LocationMap::new());
//! let resolver = Resolver::new(&map, Some("tq"));
//!
//! assert_eq!(
//!     resolver.resolve("$color!50", "color", TokenType::Any, false).unwrap(),
//!     "rgba(51, 102, 153, 0.5)"
//! );
//! assert_eq!(
//!     resolver.resolve("1px solid @color", "border", TokenType::Any, false).unwrap(),
//!     "1px solid var(--tq-color)"
//! );
//! ```

use log::{debug, warn};

use crate::error::{Result, SpecError};
use crate::parser::expression::{Expression, Segment};
use crate::parser::units::{compute, is_css_unit, split_dimension};
use crate::types::{ColorTransform, RgbaColor, TokenMap, TokenType};

/// Substitution chains deeper than this are reported as circular.
pub const MAX_DEPTH: usize = 32;

const COLOR_KEYWORDS: &[&str] = &["currentcolor", "inherit", "initial", "unset", "revert"];

/// Evaluates value expressions against one token map.
#[derive(Clone, Copy, Debug)]
pub struct Resolver<'a> {
    tokens: &'a TokenMap,
    prefix: Option<&'a str>,
}

impl<'a> Resolver<'a> {
    pub fn new(tokens: &'a TokenMap, prefix: Option<&'a str>) -> Self {
        Self { tokens, prefix }
    }

    pub fn tokens(&self) -> &'a TokenMap {
        self.tokens
    }

    /// Resolves `raw` and validates the result as `kind`.
    ///
    /// With `inline`, `@name` references are replaced by their literal value
    /// instead of a custom property reference.
    pub fn resolve(&self, raw: &str, property: &str, kind: TokenType, inline: bool) -> Result<String> {
        let value = self.expand(raw, inline, 0)?;
        validate(property, &value, kind)?;
        Ok(value)
    }

    /// The global custom property for a token path: `--prefix-color-primary`.
    pub fn variable_name(&self, path: &str) -> String {
        format!("--{}", self.identifier(path))
    }

    /// A token path as a prefixed identifier: `prefix-color-primary`.
    pub fn identifier(&self, path: &str) -> String {
        let name = path.replace('.', "-");
        match self.prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}-{name}"),
            _ => name,
        }
    }

    fn expand(&self, raw: &str, inline: bool, depth: usize) -> Result<String> {
        if depth > MAX_DEPTH {
            return Err(SpecError::CircularReference {
                expression: raw.to_string(),
            });
        }

        let expression = Expression::parse(raw);
        if expression.is_literal() {
            return Ok(raw.to_string());
        }

        let mut out = String::with_capacity(raw.len());
        for segment in expression.segments {
            match segment {
                Segment::Text(text) => out.push_str(&text),
                Segment::Shortcut { name, extra, alpha } => {
                    let path = match &extra {
                        Some(extra) => format!("{name}.{extra}"),
                        None => name.clone(),
                    };
                    let Some(token) = self.tokens.get(&path) else {
                        return Err(SpecError::UnknownToken {
                            expression: format!("+{path}"),
                        });
                    };
                    let value = match alpha {
                        Some(alpha) => {
                            let value = self.expand(&token.value, true, depth + 1)?;
                            ColorTransform::Alpha(alpha).apply(&value).unwrap_or(value)
                        }
                        None if inline => self.expand(&token.value, true, depth + 1)?,
                        None => format!("var({})", self.variable_name(&path)),
                    };
                    out.push_str(&value);
                }
                Segment::LocalReference { name, fallback } => {
                    let variable = format!("--this-{}", name.replace('.', "-"));
                    out.push_str(&self.var(&variable, fallback.as_deref(), inline, depth)?);
                }
                Segment::Reference { name, fallback } => {
                    if inline {
                        if let Some(token) = self.tokens.get(&name) {
                            out.push_str(&self.expand(&token.value, true, depth + 1)?);
                            continue;
                        }
                        if let Some(fallback) = &fallback {
                            out.push_str(&self.expand(fallback, true, depth + 1)?);
                            continue;
                        }
                        warn!("Can not inline \"@{}\", the token does not exist", name);
                    }
                    let variable = self.variable_name(&name);
                    out.push_str(&self.var(&variable, fallback.as_deref(), inline, depth)?);
                }
                Segment::Prefix { name } => out.push_str(&self.identifier(&name)),
                Segment::Copy {
                    name,
                    transform,
                    operation,
                    fallback,
                } => {
                    let mut value = match (self.tokens.get(&name), &fallback) {
                        (Some(token), _) => self.expand(&token.value, true, depth + 1)?,
                        (None, Some(fallback)) => self.expand(fallback, inline, depth + 1)?,
                        (None, None) => {
                            return Err(SpecError::UnknownToken {
                                expression: format!("${name}"),
                            });
                        }
                    };

                    if let Some(transform) = transform {
                        match transform.apply(&value) {
                            Some(transformed) => value = transformed,
                            None => debug!("\"{}\" is not a color, {:?} skipped", value, transform),
                        }
                    }

                    if let Some((op, operand)) = operation {
                        match split_dimension(&value).and_then(|(n, unit)| compute(n, unit, op, operand)) {
                            Some(computed) => value = computed,
                            None => debug!("\"{}\" is not a number, {:?} skipped", value, op),
                        }
                    }

                    out.push_str(&value);
                }
                Segment::Hex { color, transform } => {
                    out.push_str(&transform.apply(&color).unwrap_or(color));
                }
                Segment::Arithmetic {
                    value,
                    unit,
                    operator,
                    operand,
                } => match compute(value, &unit, operator, operand) {
                    Some(computed) => out.push_str(&computed),
                    None => {
                        debug!("Division by zero in \"{}\"", raw);
                        out.push_str(&format!("{value}{unit}"));
                    }
                },
            }
        }

        Ok(out)
    }

    fn var(&self, variable: &str, fallback: Option<&str>, inline: bool, depth: usize) -> Result<String> {
        Ok(match fallback {
            Some(fallback) => {
                let fallback = self.expand(fallback, inline, depth + 1)?;
                format!("var({variable}, {fallback})")
            }
            None => format!("var({variable})"),
        })
    }
}

/// Checks a resolved literal against its declared type.
///
/// Values that still hold a `var(`/`calc(` call or an unresolved sigil are
/// not checked.
pub fn validate(property: &str, value: &str, kind: TokenType) -> Result<()> {
    let value = value.trim();
    if kind == TokenType::Any || is_deferred(value) {
        return Ok(());
    }

    let valid = match kind {
        TokenType::Color => {
            COLOR_KEYWORDS.contains(&value.to_ascii_lowercase().as_str())
                || RgbaColor::parse(value).is_ok()
        }
        TokenType::Unit => is_css_unit(value),
        TokenType::Number => value.parse::<f64>().is_ok(),
        TokenType::Boolean => value == "true" || value == "false",
        TokenType::Any => true,
    };

    if valid {
        Ok(())
    } else {
        Err(SpecError::Validation {
            property: property.to_string(),
            value: value.to_string(),
            kind,
        })
    }
}

fn is_deferred(value: &str) -> bool {
    if value.contains("var(") || value.contains("calc(") {
        return true;
    }

    let mut chars = value.chars();
    match chars.next() {
        Some('@' | '$' | '~' | '{') => true,
        Some('+') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}
