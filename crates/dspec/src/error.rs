//! Error types for design specification parsing and value resolution.
//!
//! This module defines the errors raised while parsing a document, evaluating
//! value expressions and validating resolved literals against their declared
//! token type.

use thiserror::Error;

use crate::types::TokenType;

/// Errors that can occur while parsing or resolving a design specification.
///
/// # Examples
///
/// ```rust
/// use dspec::parser::parse_document;
///
/// // Missing closing brace
/// let result = parse_document("{ \"name\": \"broken\"", false);
/// assert!(result.is_err());
/// ```
#[derive(Error, Debug)]
pub enum SpecError {
    /// Invalid JSON or expression syntax.
    ///
    /// Line and column point at the first unparsable character.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    /// The JSON was well formed but does not describe a design specification.
    #[error("invalid design specification: {0}")]
    Json(#[from] serde_json::Error),

    /// A `$copy` or `+shortcut` expression names a token that does not exist
    /// and carries no fallback.
    #[error("can not find the token value of \"{expression}\"")]
    UnknownToken { expression: String },

    /// A substitution chain references itself.
    #[error("circular token reference while resolving \"{expression}\"")]
    CircularReference { expression: String },

    /// A fully substituted literal does not match its declared token type.
    #[error("the value of \"{property}: ( {value} )\" must be a valid {kind}")]
    Validation {
        property: String,
        value: String,
        kind: TokenType,
    },
}

pub type Result<T> = std::result::Result<T, SpecError>;
