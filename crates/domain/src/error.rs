//! Error taxonomy for callback offers and dispatch
//!
//! Each error kind maps to a single point in the callback lifecycle:
//! - [`InvalidTokenError`] - a token could not be decoded (client side, 4xx)
//! - [`InvalidTargetError`] - an offer names an operation that does not resolve
//! - [`ArgumentEncodingError`] - one authoring-time argument could not be classified
//! - [`TargetInvocationError`] - the invoked operation failed
//! - [`DescriptorError`] - argument positions violate the descriptor invariants

use serde_json::Value;
use thiserror::Error;

use crate::invocation::{InvocationResult, STATUS_INTERNAL_SERVER_ERROR};

/// A token was absent, malformed, altered, or sealed under another key.
///
/// Carries no detail: the message is what the client sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid callback url")]
pub struct InvalidTokenError;

/// The target of an offer does not resolve to a registered operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Callback target is not a registered operation: {name}")]
pub struct InvalidTargetError {
    pub name: String,
}

impl InvalidTargetError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A single authoring-time argument that could not be classified.
///
/// The argument is dropped from the descriptor; the rest of the offer
/// still encodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentEncodingError {
    /// An unquoted string with nothing left after trimming.
    #[error("Argument {position} is an empty client expression")]
    EmptyExpression { position: usize },

    /// Starts or ends with a quote character without a matching partner.
    #[error("Argument {position} has unbalanced quotes: {raw}")]
    UnbalancedQuote { position: usize, raw: String },

    /// NaN or infinity cannot be carried as a literal.
    #[error("Argument {position} is not a finite number")]
    NonFiniteNumber { position: usize },
}

impl ArgumentEncodingError {
    /// Position of the rejected argument in the authoring-time list.
    pub fn position(&self) -> usize {
        match self {
            Self::EmptyExpression { position }
            | Self::UnbalancedQuote { position, .. }
            | Self::NonFiniteNumber { position } => *position,
        }
    }
}

/// Descriptor positions that break the disjoint/unique invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("Position {0} is used by more than one literal argument")]
    DuplicateLiteral(usize),

    #[error("Position {0} is listed more than once as client evaluated")]
    DuplicateClientPosition(usize),

    #[error("Position {0} is both a literal and a client-evaluated argument")]
    Overlap(usize),

    #[error("Position {position} exceeds the argument limit of {limit}")]
    PositionOutOfRange { position: usize, limit: usize },
}

/// Failure raised by an invoked operation.
///
/// Mirrors the three shapes an operation can fail with: a bare status code,
/// a structured `{statusCode, message}` object, or anything else, which is
/// reported by its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetInvocationError {
    #[error("Operation failed with status {0}")]
    Status(u16),

    #[error("{message}")]
    Structured { status_code: u16, message: String },

    #[error("{0}")]
    Message(String),
}

impl TargetInvocationError {
    /// Structured failure with an explicit HTTP status.
    pub fn with_status(status_code: u16, message: impl Into<String>) -> Self {
        Self::Structured {
            status_code,
            message: message.into(),
        }
    }

    /// Plain failure reported as an internal server error.
    pub fn message(message: impl ToString) -> Self {
        Self::Message(message.to_string())
    }

    /// Status code surfaced to the client.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Status(code) => *code,
            Self::Structured { status_code, .. } => *status_code,
            Self::Message(_) => STATUS_INTERNAL_SERVER_ERROR,
        }
    }

    /// Message surfaced to the client. Bare status codes carry none.
    pub fn client_message(&self) -> String {
        match self {
            Self::Status(_) => String::new(),
            Self::Structured { message, .. } => message.clone(),
            Self::Message(message) => message.clone(),
        }
    }

    /// Convert into the failure variant of [`InvocationResult`].
    pub fn into_result(self) -> InvocationResult {
        InvocationResult::fail(self.status_code(), self.client_message())
    }
}

impl From<String> for TargetInvocationError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for TargetInvocationError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

/// Classify a dynamically shaped error value.
///
/// Numbers are bare status codes, objects exposing `statusCode` are
/// structured errors, strings are messages. Everything else is reported by
/// its JSON text.
impl From<Value> for TargetInvocationError {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => match n.as_u64().and_then(|code| u16::try_from(code).ok()) {
                Some(code) => Self::Status(code),
                None => Self::Message(n.to_string()),
            },
            Value::Object(ref map) if map.contains_key("statusCode") => {
                let status_code = map
                    .get("statusCode")
                    .and_then(Value::as_u64)
                    .and_then(|code| u16::try_from(code).ok())
                    .unwrap_or(STATUS_INTERNAL_SERVER_ERROR);
                let message = match map.get("message") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                Self::Structured {
                    status_code,
                    message,
                }
            }
            Value::String(s) => Self::Message(s),
            other => Self::Message(other.to_string()),
        }
    }
}
