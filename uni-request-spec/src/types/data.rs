//! Request and response payloads.

use bytes::Bytes;
use serde_json::Value;

/// Outgoing request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestData {
    /// Structured data; serialized as JSON, or as a query/form string
    /// depending on method and content type.
    Json(Value),
    /// Sent verbatim.
    Text(String),
    /// Sent verbatim.
    Binary(Bytes),
}

impl RequestData {
    /// The structured value, if this payload is JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for RequestData {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for RequestData {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RequestData {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for RequestData {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}

impl From<Vec<u8>> for RequestData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(bytes))
    }
}

/// Incoming response payload as delivered by the transport.
///
/// An empty body decoded as JSON is `Json(Value::Null)`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    Json(Value),
    Text(String),
    Binary(Bytes),
}

impl ResponseData {
    pub fn null() -> Self {
        Self::Json(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Json(Value::Null))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl Default for ResponseData {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Value> for ResponseData {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for ResponseData {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ResponseData {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for ResponseData {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}
