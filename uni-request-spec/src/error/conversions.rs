//! Type Conversions for RequestError
//!
//! This module contains From trait implementations for converting
//! common error types into RequestError.

use super::types::RequestError;

// Lets interceptors use `?` on JSON work.
impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        Self::interceptor(err.to_string())
    }
}
