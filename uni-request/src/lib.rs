//! uni-request
//!
//! Request client with interceptor chains, per-call retry and timeout,
//! cancellation by request id and a shared loading indicator, running over a
//! pluggable callback-style transport.
//!
//! ```rust,ignore
//! use uni_request::{Request, RequestOptions};
//!
//! let client = Request::new(RequestOptions::new().with_base_url("https://api.example.com"));
//! client.interceptors().request.use_sync(|mut config| {
//!     config.header.insert("Authorization".into(), "Bearer token".into());
//!     Ok(config)
//! });
//! let user = client.get("/users/1", None).await?;
//! ```
#![deny(unsafe_code)]

pub mod client;
mod execution;
pub mod interceptor;
pub mod loading;
pub mod registry;
pub mod retry;
pub mod telemetry;
pub mod transport;
mod utils;

pub use client::{Request, create_request, request};
pub use interceptor::{
    FnInterceptor, Interceptor, InterceptorId, InterceptorManager, Interceptors,
    LoggingInterceptor,
};
pub use loading::{LoadingCoordinator, LoadingIndicator, LoadingOptions, TracingIndicator};
pub use registry::{TaskRegistry, generate_request_id};
pub use retry::{RetryExecutor, RetryPolicy};
pub use transport::{
    Completion, DownloadRequest, ReqwestTransport, TaskHandle, Transport, TransportRequest,
    UploadRequest,
};

pub use uni_request_spec::{
    DataType, DownloadOptions, DownloadResponse, ErrorKind, HTTP_STATUS, HttpStatus, Method,
    RequestConfig, RequestData, RequestError, RequestOptions, RequestResponse, ResponseData,
    ResponseType, UploadOptions, UploadResponse, is_client_error_status, is_redirect_status,
    is_server_error_status, is_success_status, status_code, transform_request,
    transform_response,
};
