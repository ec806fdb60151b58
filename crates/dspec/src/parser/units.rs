//! Numeric dimensions and unit arithmetic.

use nom::{
    IResult,
    bytes::complete::take_while,
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize},
    sequence::{delimited, pair, preceded, tuple},
};

/// CSS units accepted by `unit` tokens.
pub const CSS_UNITS: &[&str] = &[
    "%", "ch", "cm", "deg", "dvh", "dvw", "em", "ex", "fr", "grad", "in", "lh", "lvh", "lvw",
    "mm", "ms", "pc", "pt", "px", "q", "rad", "rem", "rlh", "s", "svh", "svw", "turn", "vb",
    "vh", "vi", "vmax", "vmin", "vw",
];

/// An arithmetic operator of the `<number><unit>(<op><number>)` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn from_char(c: char) -> Self {
        match c {
            '+' => Operator::Add,
            '-' => Operator::Subtract,
            '*' => Operator::Multiply,
            _ => Operator::Divide,
        }
    }

    /// Applies the operator; `None` on division by zero.
    pub fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        match self {
            Operator::Add => Some(lhs + rhs),
            Operator::Subtract => Some(lhs - rhs),
            Operator::Multiply => Some(lhs * rhs),
            Operator::Divide if rhs == 0.0 => None,
            Operator::Divide => Some(lhs / rhs),
        }
    }
}

/// Parse a floating point or integer number.
pub fn parse_number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// Parse a number followed by an optional unit (`16px`, `50%`, `1.5`).
pub fn parse_dimension(input: &str) -> IResult<&str, (f64, &str)> {
    pair(
        parse_number,
        take_while(|c: char| c.is_ascii_alphabetic() || c == '%'),
    )(input)
}

/// Parse an operation suffix such as `(*1.5)` or `( - 2 )`.
pub fn parse_operation(input: &str) -> IResult<&str, (Operator, f64)> {
    delimited(
        pair(char('('), multispace0),
        pair(
            map(one_of("+-*/"), Operator::from_char),
            preceded(multispace0, parse_number),
        ),
        pair(multispace0, char(')')),
    )(input)
}

/// Splits a whole string into number and unit.
pub fn split_dimension(value: &str) -> Option<(f64, &str)> {
    match parse_dimension(value.trim()) {
        Ok(("", parts)) => Some(parts),
        _ => None,
    }
}

/// True for `0` or a number with a recognized CSS unit.
pub fn is_css_unit(value: &str) -> bool {
    match split_dimension(value) {
        Some((n, "")) => n == 0.0,
        Some((_, unit)) => CSS_UNITS.contains(&unit.to_ascii_lowercase().as_str()),
        None => false,
    }
}

/// Evaluates `value <op> operand` and rounds to a whole unit.
pub fn compute(value: f64, unit: &str, op: Operator, operand: f64) -> Option<String> {
    let result = op.apply(value, operand)?.round();
    // Normalize -0 to 0.
    let result = if result == 0.0 { 0.0 } else { result };
    Some(format!("{}{}", result, unit))
}
