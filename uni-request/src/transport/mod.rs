//! Transport abstraction.
//!
//! A transport performs exactly one network operation per call and reports the
//! outcome through a one-shot completion callback, handing back a task handle
//! that can abort the operation while it is in flight. The client wraps this
//! callback contract into a suspendable call with timeout, retry and
//! cancellation on top; the transport itself stays oblivious to all three.

mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use uni_request_spec::{
    DataType, DownloadResponse, Method, RequestConfig, RequestData, RequestError,
    RequestResponse, ResponseType, UploadResponse,
};

/// Callback invoked once with the outcome of a transport operation.
pub type Completion<T> = Box<dyn FnOnce(Result<T, RequestError>) + Send + 'static>;

/// Abortable handle to one in-flight transport operation.
pub trait TaskHandle: Send + Sync {
    /// Abort the operation. Aborting a finished operation has no effect.
    fn abort(&self);
}

/// Descriptor handed to [`Transport::request`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub data: Option<RequestData>,
    pub header: HashMap<String, String>,
    pub timeout: Option<Duration>,
    pub data_type: DataType,
    pub response_type: ResponseType,
}

impl From<&RequestConfig> for TransportRequest {
    fn from(config: &RequestConfig) -> Self {
        Self {
            url: config.url.clone(),
            method: config.method,
            data: config.data.clone(),
            header: config.header.clone(),
            timeout: config.effective_timeout(),
            data_type: config.data_type,
            response_type: config.response_type,
        }
    }
}

/// Descriptor handed to [`Transport::upload`].
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub url: String,
    pub file_path: String,
    pub name: String,
    pub form_data: HashMap<String, String>,
    pub header: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

/// Descriptor handed to [`Transport::download`].
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub url: String,
    pub header: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

/// Platform network primitive.
///
/// Implementations must invoke `complete` at most once. They may drop it
/// without calling it when the task is aborted.
pub trait Transport: Send + Sync {
    fn request(
        &self,
        request: TransportRequest,
        complete: Completion<RequestResponse>,
    ) -> Arc<dyn TaskHandle>;

    fn upload(
        &self,
        request: UploadRequest,
        complete: Completion<UploadResponse>,
    ) -> Arc<dyn TaskHandle>;

    fn download(
        &self,
        request: DownloadRequest,
        complete: Completion<DownloadResponse>,
    ) -> Arc<dyn TaskHandle>;
}
