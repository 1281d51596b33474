//! Authoring-time arguments and the quoting rule that classifies them.
//!
//! When a callback is offered, each argument is either a literal fixed on the
//! server or the name/expression of a client-side variable whose value is
//! only known when the client calls back. Strings are ambiguous, so quoting
//! decides:
//!
//! - `'"abc"'` or `"'abc'"` - literal string `abc` (quotes removed)
//! - `'x'` - client expression `x`, evaluated in the browser
//! - numbers and booleans - literals, kept as-is
//! - null - skipped
//!
//! ```
//! use callgate_domain::{classify, Classified, LiteralValue, SourceArg};
//!
//! let literal = classify(0, &SourceArg::from("\"abc\"")).expect("valid literal");
//! assert_eq!(literal, Some(Classified::Literal(LiteralValue::from("abc"))));
//!
//! let expression = classify(1, &SourceArg::from("x")).expect("valid expression");
//! assert_eq!(expression, Some(Classified::ClientExpression("x".to_string())));
//! ```

use serde_json::Number;

use super::LiteralValue;
use crate::error::ArgumentEncodingError;

const QUOTES: [char; 2] = ['\'', '"'];

/// An argument as written by the code offering the callback.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceArg {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl From<&str> for SourceArg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for SourceArg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for SourceArg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SourceArg {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for SourceArg {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<SourceArg>> From<Option<T>> for SourceArg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Outcome of classifying one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Value fixed at offer time.
    Literal(LiteralValue),
    /// Client-side expression resolved when the callback fires.
    ClientExpression(String),
}

/// Classify a single argument.
///
/// Returns `Ok(None)` for null arguments, which are skipped without error.
pub fn classify(
    position: usize,
    arg: &SourceArg,
) -> Result<Option<Classified>, ArgumentEncodingError> {
    match arg {
        SourceArg::Null => Ok(None),
        SourceArg::Bool(b) => Ok(Some(Classified::Literal(LiteralValue::Bool(*b)))),
        SourceArg::Int(i) => Ok(Some(Classified::Literal(LiteralValue::Number(Number::from(
            *i,
        ))))),
        SourceArg::Float(f) => Number::from_f64(*f)
            .map(|n| Some(Classified::Literal(LiteralValue::Number(n))))
            .ok_or(ArgumentEncodingError::NonFiniteNumber { position }),
        SourceArg::Str(raw) => classify_str(position, raw).map(Some),
    }
}

fn classify_str(position: usize, raw: &str) -> Result<Classified, ArgumentEncodingError> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let first = chars.next();
    let last = chars.next_back();

    let starts_quoted = first.is_some_and(|c| QUOTES.contains(&c));
    let ends_quoted = last.or(first).is_some_and(|c| QUOTES.contains(&c));

    match (first, last) {
        (None, _) => Err(ArgumentEncodingError::EmptyExpression { position }),
        (Some(open), Some(close)) if starts_quoted && open == close => {
            let inner = &trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()];
            Ok(Classified::Literal(LiteralValue::String(inner.to_string())))
        }
        _ if starts_quoted || ends_quoted => Err(ArgumentEncodingError::UnbalancedQuote {
            position,
            raw: raw.to_string(),
        }),
        _ => Ok(Classified::ClientExpression(trimmed.to_string())),
    }
}

/// Result of classifying a whole argument list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedArguments {
    /// `(position, value)` pairs in ascending position order.
    pub literals: Vec<(usize, LiteralValue)>,
    /// Ascending positions resolved from the request.
    pub client_positions: Vec<usize>,
    /// Client expressions, parallel to `client_positions`.
    pub client_expressions: Vec<String>,
    /// Arguments that were dropped, in position order.
    pub rejected: Vec<ArgumentEncodingError>,
}

impl ClassifiedArguments {
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.client_positions.is_empty()
    }
}

/// Classify every argument, continuing past malformed ones.
pub fn classify_arguments(args: &[SourceArg]) -> ClassifiedArguments {
    let mut out = ClassifiedArguments::default();

    for (position, arg) in args.iter().enumerate() {
        match classify(position, arg) {
            Ok(Some(Classified::Literal(value))) => out.literals.push((position, value)),
            Ok(Some(Classified::ClientExpression(expr))) => {
                out.client_positions.push(position);
                out.client_expressions.push(expr);
            }
            Ok(None) => {}
            Err(e) => out.rejected.push(e),
        }
    }

    out
}
