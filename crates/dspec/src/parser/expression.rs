//! Tokenizer for the value expression language.
//!
//! A raw value is split into literal text and substitution segments. Each
//! sigil is recognized only at a word boundary, so `a@b` or `x+y` stay text.
//!
//! | Form | Segment |
//! |---|---|
//! | `+name[:extra][=alpha]` | [`Segment::Shortcut`] |
//! | `~name[\|fallback]` | [`Segment::LocalReference`] |
//! | `@name[\|fallback]` | [`Segment::Reference`] |
//! | `{name}` | [`Segment::Prefix`] |
//! | `$name[!n =n <n >n ^n][(op n)][:fallback]` | [`Segment::Copy`] |
//! | `#hex` followed by a transform | [`Segment::Hex`] |
//! | `<number><unit>(<op><number>)` | [`Segment::Arithmetic`] |
//!
//! ```rust
//! use dspec::parser::expression::{Expression, Segment};
//!
//! let expr = Expression::parse("1px solid @color.border|#ccc");
//! assert_eq!(expr.segments[0], Segment::Text("1px solid ".into()));
//! assert_eq!(
//!     expr.segments[1],
//!     Segment::Reference { name: "color.border".into(), fallback: Some("#ccc".into()) }
//! );
//! ```

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{take_while_m_n, take_while1},
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{map, map_opt, map_res, opt, peek, recognize, verify},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
};

use crate::parser::units::{Operator, parse_dimension, parse_operation};
use crate::types::color::ColorTransform;

/// One piece of a tokenized value.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    Text(String),
    Shortcut {
        name: String,
        extra: Option<String>,
        alpha: Option<f64>,
    },
    LocalReference {
        name: String,
        fallback: Option<String>,
    },
    Reference {
        name: String,
        fallback: Option<String>,
    },
    Prefix {
        name: String,
    },
    Copy {
        name: String,
        transform: Option<ColorTransform>,
        operation: Option<(Operator, f64)>,
        fallback: Option<String>,
    },
    Hex {
        color: String,
        transform: ColorTransform,
    },
    Arithmetic {
        value: f64,
        unit: String,
        operator: Operator,
        operand: f64,
    },
}

/// A tokenized value.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    pub segments: Vec<Segment>,
}

impl Expression {
    /// Splits `input` into segments. Never fails: anything that is not a
    /// well-formed substitution is kept as text.
    pub fn parse(input: &str) -> Self {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut rest = input;
        let mut prev: Option<char> = None;

        while let Some(c) = rest.chars().next() {
            let at_boundary = prev.is_none_or(|p| !is_word_char(p));

            if at_boundary {
                if let Ok((after, segment)) = substitution(rest) {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(segment);
                    prev = rest[..rest.len() - after.len()].chars().last();
                    rest = after;
                    continue;
                }
            }

            text.push(c);
            prev = Some(c);
            rest = &rest[c.len_utf8()..];
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Self { segments }
    }

    /// True when no segment needs substitution.
    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Text(_)))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn substitution(input: &str) -> IResult<&str, Segment> {
    alt((
        shortcut,
        local_reference,
        reference,
        prefix,
        copy,
        hex,
        arithmetic,
    ))(input)
}

/// `color.primary`, `color.primary.@dark`.
pub fn token_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(is_name_char),
        many0(pair(
            char('.'),
            pair(opt(char('@')), take_while1(is_name_char)),
        )),
    ))(input)
}

/// A fallback runs to the next top-level whitespace, `,` or `)`.
fn fallback_text(input: &str) -> IResult<&str, &str> {
    let mut depth = 0usize;
    let mut end = input.len();

    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => {
                end = i;
                break;
            }
            ')' => depth -= 1,
            c if depth == 0 && (c.is_whitespace() || c == ',') => {
                end = i;
                break;
            }
            _ => {}
        }
    }

    if end == 0 {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TakeWhile1,
        )));
    }

    Ok((&input[end..], &input[..end]))
}

fn amount(input: &str) -> IResult<&str, f64> {
    map_res(recognize(pair(digit1, opt(pair(char('.'), digit1)))), |s: &str| {
        s.parse::<f64>()
    })(input)
}

fn transform(input: &str) -> IResult<&str, ColorTransform> {
    map_opt(pair(one_of("!=<>^"), amount), |(sigil, n)| {
        ColorTransform::from_sigil(sigil, n)
    })(input)
}

fn shortcut(input: &str) -> IResult<&str, Segment> {
    map(
        preceded(
            pair(char('+'), peek(satisfy(|c| c.is_ascii_alphabetic()))),
            tuple((
                token_name,
                opt(preceded(char(':'), token_name)),
                opt(preceded(char('='), amount)),
            )),
        ),
        |(name, extra, alpha)| Segment::Shortcut {
            name: name.to_string(),
            extra: extra.map(str::to_string),
            alpha,
        },
    )(input)
}

fn local_reference(input: &str) -> IResult<&str, Segment> {
    map(
        preceded(char('~'), pair(token_name, opt(preceded(char('|'), fallback_text)))),
        |(name, fallback)| Segment::LocalReference {
            name: name.to_string(),
            fallback: fallback.map(str::to_string),
        },
    )(input)
}

fn reference(input: &str) -> IResult<&str, Segment> {
    map(
        preceded(char('@'), pair(token_name, opt(preceded(char('|'), fallback_text)))),
        |(name, fallback)| Segment::Reference {
            name: name.to_string(),
            fallback: fallback.map(str::to_string),
        },
    )(input)
}

fn prefix(input: &str) -> IResult<&str, Segment> {
    map(delimited(char('{'), token_name, char('}')), |name| Segment::Prefix {
        name: name.to_string(),
    })(input)
}

fn copy(input: &str) -> IResult<&str, Segment> {
    map(
        preceded(
            char('$'),
            tuple((
                token_name,
                opt(transform),
                opt(parse_operation),
                opt(preceded(char(':'), fallback_text)),
            )),
        ),
        |(name, transform, operation, fallback)| Segment::Copy {
            name: name.to_string(),
            transform,
            operation,
            fallback: fallback.map(str::to_string),
        },
    )(input)
}

fn hex(input: &str) -> IResult<&str, Segment> {
    map(
        pair(
            recognize(pair(
                char('#'),
                verify(take_while_m_n(3, 8, |c: char| c.is_ascii_hexdigit()), |s: &str| {
                    matches!(s.len(), 3 | 4 | 6 | 8)
                }),
            )),
            transform,
        ),
        |(color, transform)| Segment::Hex {
            color: color.to_string(),
            transform,
        },
    )(input)
}

fn arithmetic(input: &str) -> IResult<&str, Segment> {
    map(
        pair(parse_dimension, parse_operation),
        |((value, unit), (operator, operand))| Segment::Arithmetic {
            value,
            unit: unit.to_string(),
            operator,
            operand,
        },
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    // ==================== SIGIL TESTS ====================

    #[test]
    fn test_plain_text_is_literal() {
        let expr = Expression::parse("1px solid red");
        assert!(expr.is_literal());
        assert_eq!(expr.segments, vec![text("1px solid red")]);
    }

    #[test]
    fn test_reference_with_query_segment() {
        let expr = Expression::parse("@color.primary.@dark");
        assert_eq!(
            expr.segments,
            vec![Segment::Reference {
                name: "color.primary.@dark".into(),
                fallback: None
            }]
        );
    }

    #[test]
    fn test_fallback_stops_at_comma_and_paren() {
        let expr = Expression::parse("rgba(@a|1, ~b|var(--c, 2))");
        assert_eq!(
            expr.segments,
            vec![
                text("rgba("),
                Segment::Reference {
                    name: "a".into(),
                    fallback: Some("1".into())
                },
                text(", "),
                Segment::LocalReference {
                    name: "b".into(),
                    fallback: Some("var(--c, 2)".into())
                },
                text(")"),
            ]
        );
    }

    #[test]
    fn test_copy_with_transform_and_fallback() {
        let expr = Expression::parse("$color.primary!50:#000");
        assert_eq!(
            expr.segments,
            vec![Segment::Copy {
                name: "color.primary".into(),
                transform: Some(ColorTransform::Alpha(50.0)),
                operation: None,
                fallback: Some("#000".into()),
            }]
        );
    }

    #[test]
    fn test_copy_with_operation() {
        let expr = Expression::parse("$size.base(*2)");
        assert_eq!(
            expr.segments,
            vec![Segment::Copy {
                name: "size.base".into(),
                transform: None,
                operation: Some((Operator::Multiply, 2.0)),
                fallback: None,
            }]
        );
    }

    #[test]
    fn test_shortcut() {
        let expr = Expression::parse("+color:hover=40");
        assert_eq!(
            expr.segments,
            vec![Segment::Shortcut {
                name: "color".into(),
                extra: Some("hover".into()),
                alpha: Some(40.0),
            }]
        );
    }

    #[test]
    fn test_hex_needs_transform() {
        assert!(Expression::parse("#336699").is_literal());
        assert_eq!(
            Expression::parse("#336699<20").segments,
            vec![Segment::Hex {
                color: "#336699".into(),
                transform: ColorTransform::Darken(20.0)
            }]
        );
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(
            Expression::parse("16px(*1.5)").segments,
            vec![Segment::Arithmetic {
                value: 16.0,
                unit: "px".into(),
                operator: Operator::Multiply,
                operand: 1.5,
            }]
        );
    }

    #[test]
    fn test_prefix() {
        assert_eq!(
            Expression::parse("{fade.in} 1s").segments,
            vec![Segment::Prefix { name: "fade.in".into() }, text(" 1s")]
        );
    }

    // ==================== BOUNDARY TESTS ====================

    #[test]
    fn test_sigils_inside_words_are_text() {
        assert!(Expression::parse("user@example.com").is_literal());
        assert!(Expression::parse("a+b").is_literal());
        assert!(Expression::parse("calc(1px + 2px)").is_literal());
        assert!(Expression::parse("var(--x)").is_literal());
    }

    #[test]
    fn test_trailing_dot_is_not_part_of_name() {
        assert_eq!(
            Expression::parse("@a.").segments,
            vec![
                Segment::Reference {
                    name: "a".into(),
                    fallback: None
                },
                text(".")
            ]
        );
    }
}
