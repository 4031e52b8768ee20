//! Body transforms.
//!
//! Outgoing data is serialized to JSON or flattened into `key=value` pairs;
//! incoming bodies are decoded defensively, never failing on bad input.

use serde_json::Value;

use crate::types::ResponseData;

/// String coercion with the platform's rules: strings are taken verbatim,
/// objects collapse to `[object Object]`, arrays join their elements with
/// `,` (null elements become empty).
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Transforms applied to outgoing data.
pub mod transform_request {
    use super::*;

    pub fn json(data: &Value) -> Result<String, serde_json::Error> {
        serde_json::to_string(data)
    }

    /// `key=value` pairs joined by `&`, in the object's insertion order.
    ///
    /// Values are coerced to strings but not percent-encoded; non-object data
    /// yields an empty string.
    pub fn form_data(data: &Value) -> String {
        pairs(data, |s| s.to_string())
    }

    /// Same layout as [`form_data`].
    pub fn query_string(data: &Value) -> String {
        form_data(data)
    }

    /// Percent-encoded variant of [`form_data`] for putting on the wire.
    pub fn url_encoded(data: &Value) -> String {
        pairs(data, |s| urlencoding::encode(s).into_owned())
    }

    fn pairs(data: &Value, encode: impl Fn(&str) -> String) -> String {
        let Value::Object(map) = data else {
            return String::new();
        };
        map.iter()
            .map(|(key, value)| format!("{}={}", encode(key), encode(&coerce_to_string(value))))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Transforms applied to incoming bodies.
pub mod transform_response {
    use super::*;

    /// Structured payloads pass through; text is parsed as JSON, falling back
    /// to the original text when it does not parse.
    pub fn json(data: ResponseData) -> ResponseData {
        match data {
            ResponseData::Text(text) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => ResponseData::Json(value),
                Err(_) => ResponseData::Text(text),
            },
            other => other,
        }
    }

    pub fn text(data: &ResponseData) -> String {
        match data {
            ResponseData::Json(value) => coerce_to_string(value),
            ResponseData::Text(text) => text.clone(),
            ResponseData::Binary(_) => "[object ArrayBuffer]".to_string(),
        }
    }

    /// Binary payloads are returned unchanged.
    pub fn array_buffer(data: ResponseData) -> ResponseData {
        data
    }
}
