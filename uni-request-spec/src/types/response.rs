//! Response of a verb request.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::data::ResponseData;

/// Settled response of `get`/`post`/... calls.
///
/// Any HTTP status counts as a settled response; only transport-level
/// failures surface as errors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestResponse {
    pub data: ResponseData,
    pub status_code: u16,
    pub header: HashMap<String, String>,
    pub cookies: Vec<String>,
    pub profile: Option<Value>,
}

impl RequestResponse {
    pub fn new(status_code: u16, data: impl Into<ResponseData>) -> Self {
        Self {
            data: data.into(),
            status_code,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(name.into(), value.into());
        self
    }

    /// Deserialize the payload into `T`.
    ///
    /// Text and binary payloads are parsed as JSON first.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.data {
            ResponseData::Json(value) => T::deserialize(value),
            ResponseData::Text(text) => serde_json::from_str(text),
            ResponseData::Binary(bytes) => serde_json::from_slice(bytes),
        }
    }

    pub fn is_success(&self) -> bool {
        crate::status::is_success_status(self.status_code)
    }
}
