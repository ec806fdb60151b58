//! JSON parsing with source locations.
//!
//! Produces the same [`serde_json::Value`] as `serde_json::from_str`, plus a
//! [`LocationMap`] from logical path to the position where each value starts.
//!
//! ```rust
//! use dspec::parser::json::parse_with_locations;
//!
//! let (value, locations) = parse_with_locations("{\n  \"name\": \"base\"\n}").unwrap();
//! assert_eq!(value["name"], "base");
//!
//! let at = locations.get("name").unwrap();
//! assert_eq!((at.line, at.column), (2, 10));
//! ```

use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{map, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, separated_pair, tuple},
};
use serde_json::{Map, Number, Value};

use crate::error::{Result, SpecError};
use crate::types::location::{LocationMap, SourceLocation, child_path};

/// Deepest array/object nesting accepted, as in `serde_json`.
const MAX_DEPTH: usize = 128;

/// A parsed value and how much input was left when it started.
#[derive(Clone, Debug)]
struct Spanned {
    remaining: usize,
    node: Node,
}

#[derive(Clone, Debug)]
enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Spanned>),
    Object(Vec<(String, Spanned)>),
}

/// Parses JSON text, recording where every value starts.
pub fn parse_with_locations(source: &str) -> Result<(Value, LocationMap)> {
    let lines = LineIndex::new(source);

    let (rest, root) = json_value(source, 0).map_err(|e| {
        let (remaining, message) = match &e {
            nom::Err::Error(err) | nom::Err::Failure(err) if err.code == ErrorKind::TooLarge => {
                (err.input.len(), "nesting too deep")
            }
            nom::Err::Error(err) | nom::Err::Failure(err) => (err.input.len(), "invalid JSON value"),
            nom::Err::Incomplete(_) => (0, "invalid JSON value"),
        };
        lines.syntax_error(message, source.len() - remaining)
    })?;

    let (rest, _) = multispace0::<&str, Error<&str>>(rest)
        .map_err(|_| lines.syntax_error("invalid trailing input", source.len() - rest.len()))?;
    if !rest.is_empty() {
        return Err(lines.syntax_error("unexpected trailing characters", source.len() - rest.len()));
    }

    let mut locations = LocationMap::new();
    let value = into_value(root, "", source.len(), &lines, &mut locations);

    Ok((value, locations))
}

/// Parses JSON text with `serde_json`, without locations.
pub fn parse_compact(source: &str) -> Result<Value> {
    serde_json::from_str(source).map_err(|e| SpecError::Syntax {
        message: e.to_string(),
        line: e.line(),
        column: e.column().saturating_sub(1),
    })
}

fn into_value(
    spanned: Spanned,
    path: &str,
    total: usize,
    lines: &LineIndex,
    locations: &mut LocationMap,
) -> Value {
    locations.insert(path, lines.locate(total - spanned.remaining));

    match spanned.node {
        Node::Null => Value::Null,
        Node::Bool(b) => Value::Bool(b),
        Node::Number(n) => Value::Number(n),
        Node::String(s) => Value::String(s),
        Node::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| into_value(item, &child_path(path, i), total, lines, locations))
                .collect(),
        ),
        Node::Object(members) => {
            let mut object = Map::new();
            for (key, member) in members {
                let child = into_value(member, &child_path(path, &key), total, lines, locations);
                object.insert(key, child);
            }
            Value::Object(object)
        }
    }
}

fn json_value(input: &str, depth: usize) -> IResult<&str, Spanned> {
    let (input, _) = multispace0(input)?;
    let remaining = input.len();

    if depth > MAX_DEPTH && input.starts_with(['[', '{']) {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
    }

    let (input, node) = alt((
        map(|i| json_object(i, depth), Node::Object),
        map(|i| json_array(i, depth), Node::Array),
        map(string_literal, Node::String),
        map(number_literal, Node::Number),
        value(Node::Bool(true), tag("true")),
        value(Node::Bool(false), tag("false")),
        value(Node::Null, tag("null")),
    ))(input)?;

    Ok((input, Spanned { remaining, node }))
}

fn separator(input: &str) -> IResult<&str, char> {
    delimited(multispace0, char(','), multispace0)(input)
}

fn json_array(input: &str, depth: usize) -> IResult<&str, Vec<Spanned>> {
    delimited(
        pair(char('['), multispace0),
        separated_list0(separator, |i| json_value(i, depth + 1)),
        pair(multispace0, char(']')),
    )(input)
}

fn json_object(input: &str, depth: usize) -> IResult<&str, Vec<(String, Spanned)>> {
    delimited(
        pair(char('{'), multispace0),
        separated_list0(
            separator,
            separated_pair(
                preceded(multispace0, string_literal),
                tuple((multispace0, char(':'))),
                |i| json_value(i, depth + 1),
            ),
        ),
        pair(multispace0, char('}')),
    )(input)
}

fn number_literal(input: &str) -> IResult<&str, Number> {
    let (rest, text) = recognize(tuple((
        opt(char('-')),
        alt((tag("0"), digit1)),
        opt(pair(char('.'), digit1)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;

    let number = if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>().ok().and_then(Number::from_f64)
    } else if let Ok(n) = text.parse::<i64>() {
        Some(Number::from(n))
    } else if let Ok(n) = text.parse::<u64>() {
        Some(Number::from(n))
    } else {
        text.parse::<f64>().ok().and_then(Number::from_f64)
    };

    number
        .map(|n| (rest, n))
        .ok_or_else(|| nom::Err::Error(Error::new(input, ErrorKind::Float)))
}

fn string_literal(input: &str) -> IResult<&str, String> {
    let (mut rest, _) = char('"')(input)?;
    let mut out = String::new();

    loop {
        let mut chars = rest.chars();
        match chars.next() {
            None => return Err(nom::Err::Failure(Error::new(rest, ErrorKind::Char))),
            Some('"') => return Ok((chars.as_str(), out)),
            Some('\\') => {
                let (after, c) = escape(chars.as_str())?;
                out.push(c);
                rest = after;
            }
            Some(c) if (c as u32) < 0x20 => {
                return Err(nom::Err::Failure(Error::new(rest, ErrorKind::Char)));
            }
            Some(c) => {
                out.push(c);
                rest = chars.as_str();
            }
        }
    }
}

fn escape(input: &str) -> IResult<&str, char> {
    let mut chars = input.chars();

    let c = match chars.next() {
        Some('"') => '"',
        Some('\\') => '\\',
        Some('/') => '/',
        Some('b') => '\u{8}',
        Some('f') => '\u{c}',
        Some('n') => '\n',
        Some('r') => '\r',
        Some('t') => '\t',
        Some('u') => return unicode_escape(chars.as_str()),
        _ => return Err(escape_failure(input)),
    };

    Ok((chars.as_str(), c))
}

fn unicode_escape(input: &str) -> IResult<&str, char> {
    let (rest, high) = hex4(input).ok_or_else(|| escape_failure(input))?;

    if !(0xD800..0xDC00).contains(&high) {
        let c = char::from_u32(high).ok_or_else(|| escape_failure(input))?;
        return Ok((rest, c));
    }

    let (rest, low) = rest
        .strip_prefix("\\u")
        .and_then(hex4)
        .filter(|(_, low)| (0xDC00..0xE000).contains(low))
        .ok_or_else(|| escape_failure(rest))?;
    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    let c = char::from_u32(code).ok_or_else(|| escape_failure(input))?;

    Ok((rest, c))
}

fn escape_failure(at: &str) -> nom::Err<Error<&str>> {
    nom::Err::Failure(Error::new(at, ErrorKind::Escaped))
}

fn hex4(input: &str) -> Option<(&str, u32)> {
    let digits = input.get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let code = u32::from_str_radix(digits, 16).ok()?;
    Some((&input[4..], code))
}

/// Byte offset to line/column conversion.
struct LineIndex<'a> {
    source: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, starts }
    }

    fn locate(&self, offset: usize) -> SourceLocation {
        let line = self.starts.partition_point(|&start| start <= offset).max(1);
        let start = self.starts[line - 1];
        let column = self.source.get(start..offset).map_or(0, |s| s.chars().count());
        SourceLocation::new(line, column)
    }

    fn syntax_error(&self, message: &str, offset: usize) -> SpecError {
        let at = self.locate(offset);
        SpecError::Syntax {
            message: message.to_string(),
            line: at.line,
            column: at.column,
        }
    }
}
