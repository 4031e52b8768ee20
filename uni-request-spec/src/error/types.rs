//! Core error type.
//!
//! Every failed call surfaces as a [`RequestError`] shaped like the platform's
//! failure object: an `errMsg`, optional status code and payload, any extra
//! fields interceptors attached, and the config that produced it.

use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{RequestConfig, ResponseData};

/// `errMsg` of a call whose attempt timed out locally.
pub const TIMEOUT_ERR_MSG: &str = "request:fail timeout";
/// `errMsg` of a call cancelled through the client.
pub const ABORT_ERR_MSG: &str = "request:fail abort";

/// Where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Reported by the transport (network or platform failure).
    Transport,
    /// The attempt timer fired before the transport settled.
    Timeout,
    /// The call was cancelled by request id.
    Cancelled,
    /// Raised or replaced by an interceptor.
    Interceptor,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{err_msg}")]
pub struct RequestError {
    pub kind: ErrorKind,
    pub err_msg: String,
    pub status_code: Option<u16>,
    pub data: Option<ResponseData>,
    /// Extra fields, typically added by error interceptors.
    pub details: Map<String, Value>,
    pub config: Option<Box<RequestConfig>>,
}

impl RequestError {
    pub fn new(kind: ErrorKind, err_msg: impl Into<String>) -> Self {
        Self {
            kind,
            err_msg: err_msg.into(),
            status_code: None,
            data: None,
            details: Map::new(),
            config: None,
        }
    }

    pub fn transport(err_msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, err_msg)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(ErrorKind::Timeout, TIMEOUT_ERR_MSG)
            .with_detail("timeout", u64::try_from(after.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn cancelled(request_id: &str) -> Self {
        Self::new(ErrorKind::Cancelled, ABORT_ERR_MSG).with_detail("requestId", request_id)
    }

    pub fn interceptor(err_msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Interceptor, err_msg)
    }

    pub fn with_message(mut self, err_msg: impl Into<String>) -> Self {
        self.err_msg = err_msg.into();
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_data(mut self, data: impl Into<ResponseData>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = Some(Box::new(config));
        self
    }

    /// Attach `config` unless the error already carries one.
    pub fn or_config(mut self, config: &RequestConfig) -> Self {
        if self.config.is_none() {
            self.config = Some(Box::new(config.clone()));
        }
        self
    }

    pub fn config(&self) -> Option<&RequestConfig> {
        self.config.as_deref()
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}
