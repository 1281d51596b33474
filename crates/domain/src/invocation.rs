//! Inbound invocation requests and their results.

use std::collections::BTreeMap;

use serde_json::Value;

/// Request parameter carrying the encoded token.
pub const TOKEN_PARAM: &str = "m";

/// Request parameter carrying client-evaluated argument values, repeated
/// once per client-evaluated position in ascending position order.
pub const CLIENT_ARG_PARAM: &str = "p";

pub const STATUS_OK: u16 = 200;
pub const STATUS_NO_CONTENT: u16 = 204;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

/// Response content types an offer can force.
pub mod mime {
    pub const TEXT: &str = "application/text";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
}

/// HTTP method of the inbound call, reduced to what dispatch cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMethod {
    Get,
    #[default]
    Post,
    Other,
}

impl RequestMethod {
    pub fn parse(method: &str) -> Self {
        if method.eq_ignore_ascii_case("GET") {
            Self::Get
        } else if method.eq_ignore_ascii_case("POST") {
            Self::Post
        } else {
            Self::Other
        }
    }
}

/// One inbound callback invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationRequest {
    pub method: RequestMethod,
    /// Parameter name -> values, in arrival order per name.
    pub params: BTreeMap<String, Vec<String>>,
    /// Raw body bytes, fully read. Only decoded when the callback asks
    /// for the body.
    pub body: Option<Vec<u8>>,
}

impl InvocationRequest {
    pub fn new(method: RequestMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Append one parameter value.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_param(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn push_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.entry(name.into()).or_default().push(value.into());
    }

    /// First value of the token parameter.
    pub fn token(&self) -> Option<&str> {
        self.params
            .get(TOKEN_PARAM)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Values for client-evaluated positions, in order.
    pub fn client_values(&self) -> &[String] {
        self.params
            .get(CLIENT_ARG_PARAM)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Value returned by an invoked operation.
#[derive(Debug, Clone, PartialEq)]
pub enum CallValue {
    /// Serialized as JSON.
    Json(Value),
    /// XML document text, passed through as-is.
    Xml(String),
}

impl CallValue {
    /// No meaningful return value.
    pub fn none() -> Self {
        Self::Json(Value::Null)
    }
}

impl From<Value> for CallValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationResult {
    /// Serialized return value, sent verbatim with status 200.
    Value { mime_type: String, body: String },
    /// No payload; the client should re-render its current state.
    Refresh,
    /// No payload and no refresh.
    Acknowledged,
    /// Failure with an HTTP status and message.
    Fail { status: u16, message: String },
}

impl InvocationResult {
    pub fn fail(status: u16, message: impl Into<String>) -> Self {
        Self::Fail {
            status,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }

    /// HTTP status the transport should answer with.
    pub fn status(&self) -> u16 {
        match self {
            Self::Value { .. } | Self::Refresh => STATUS_OK,
            Self::Acknowledged => STATUS_NO_CONTENT,
            Self::Fail { status, .. } => *status,
        }
    }
}
