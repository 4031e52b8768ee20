//! Request client
//!
//! [`Request`] owns the instance defaults, both interceptor chains, the
//! loading coordinator and the task registry, and drives each logical call
//! through them:
//!
//! 1. merge the call options over the defaults and resolve the URL;
//! 2. run the request interceptors (newest first);
//! 3. acquire the loading indicator if requested;
//! 4. register the call under its request id;
//! 5. run attempts through the transport under the retry policy;
//! 6. run the response interceptors (oldest first);
//! 7. release the loading indicator.
//!
//! Every failure surfaced by the verb methods carries the config that
//! produced it.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use uni_request_spec::{
    CONTENT_TYPE, DownloadOptions, DownloadResponse, Method, RequestConfig, RequestData,
    RequestError, RequestOptions, RequestResponse, UploadOptions, UploadResponse, resolve_url,
};

use crate::execution::run_attempt;
use crate::interceptor::Interceptors;
use crate::loading::{LoadingCoordinator, LoadingIndicator, TracingIndicator};
use crate::registry::{Registration, TaskRegistry, generate_request_id};
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::transport::{
    DownloadRequest, ReqwestTransport, Transport, TransportRequest, UploadRequest,
};

const LOG_TARGET: &str = "uni_request::http";

/// Interceptor-pipelined request client.
pub struct Request {
    defaults: RequestConfig,
    interceptors: Interceptors,
    transport: Arc<dyn Transport>,
    loading: LoadingCoordinator,
    registry: TaskRegistry,
}

impl Request {
    /// Client over the default `reqwest` transport.
    pub fn new(options: RequestOptions) -> Self {
        Self::with_transport(
            options,
            Arc::new(ReqwestTransport::new()),
            Arc::new(TracingIndicator),
        )
    }

    pub fn with_transport(
        options: RequestOptions,
        transport: Arc<dyn Transport>,
        indicator: Arc<dyn LoadingIndicator>,
    ) -> Self {
        Self {
            defaults: RequestConfig::default().merge(options),
            interceptors: Interceptors::default(),
            transport,
            loading: LoadingCoordinator::new(indicator),
            registry: TaskRegistry::new(),
        }
    }

    /// Effective instance defaults.
    pub fn defaults(&self) -> &RequestConfig {
        &self.defaults
    }

    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    /// Number of calls that can currently be cancelled by id.
    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    /// Run one logical call.
    pub async fn request(&self, options: RequestOptions) -> Result<RequestResponse, RequestError> {
        let resolved = self.defaults.resolve(options);
        let mut config = self
            .interceptors
            .request
            .run_reverse(resolved.clone())
            .await
            .map_err(|e| e.or_config(&resolved))?;

        let request_id = config
            .request_id
            .get_or_insert_with(generate_request_id)
            .clone();

        let loading = config
            .loading
            .then(|| self.loading.guard(&config.loading_text));

        tracing::debug!(
            target: LOG_TARGET,
            method = %config.method,
            url = %config.url,
            request_id = %request_id,
            "dispatching request"
        );

        let registration = self.registry.register(request_id);
        let outcome = self
            .execute(&config, &registration)
            .await
            .map_err(|e| e.or_config(&config));
        drop(registration);

        match &outcome {
            Ok(response) => tracing::debug!(
                target: LOG_TARGET,
                url = %config.url,
                status = response.status_code,
                "request settled"
            ),
            Err(error) => tracing::debug!(
                target: LOG_TARGET,
                url = %config.url,
                kind = ?error.kind,
                err = %error,
                "request failed"
            ),
        }

        let result = self
            .interceptors
            .response
            .run_forward(outcome)
            .await
            .map_err(|e| e.or_config(&config));
        drop(loading);
        result
    }

    async fn execute(
        &self,
        config: &RequestConfig,
        registration: &Registration<'_>,
    ) -> Result<RequestResponse, RequestError> {
        let transport_request = TransportRequest::from(config);
        let timeout = config.effective_timeout();
        let transport = &self.transport;

        RetryExecutor::new(RetryPolicy::from_config(config))
            .execute(registration, move |attempt| {
                let request = transport_request.clone();
                tracing::trace!(
                    target: LOG_TARGET,
                    request_id = %registration.request_id(),
                    attempt,
                    "starting attempt"
                );
                run_attempt(registration, timeout, move |complete| {
                    transport.request(request, complete)
                })
            })
            .await
    }

    pub async fn get(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> Result<RequestResponse, RequestError> {
        self.send(Method::Get, url, None, options).await
    }

    pub async fn post(
        &self,
        url: &str,
        data: Option<RequestData>,
        options: Option<RequestOptions>,
    ) -> Result<RequestResponse, RequestError> {
        self.send(Method::Post, url, data, options).await
    }

    pub async fn put(
        &self,
        url: &str,
        data: Option<RequestData>,
        options: Option<RequestOptions>,
    ) -> Result<RequestResponse, RequestError> {
        self.send(Method::Put, url, data, options).await
    }

    pub async fn delete(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> Result<RequestResponse, RequestError> {
        self.send(Method::Delete, url, None, options).await
    }

    pub async fn head(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> Result<RequestResponse, RequestError> {
        self.send(Method::Head, url, None, options).await
    }

    pub async fn options(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> Result<RequestResponse, RequestError> {
        self.send(Method::Options, url, None, options).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        data: Option<RequestData>,
        options: Option<RequestOptions>,
    ) -> Result<RequestResponse, RequestError> {
        let mut options = options.unwrap_or_default().with_url(url).with_method(method);
        if data.is_some() {
            options.data = data;
        }
        self.request(options).await
    }

    /// Upload a local file as multipart form data.
    ///
    /// Bypasses interceptors, retry and the loading indicator. Failures are
    /// returned as the transport reported them.
    pub async fn upload(&self, options: UploadOptions) -> Result<UploadResponse, RequestError> {
        let UploadOptions {
            url,
            file_path,
            name,
            form_data,
            header,
            timeout,
            request_id,
        } = options;
        let timeout = self.transfer_timeout(timeout);
        let request = UploadRequest {
            url: resolve_url(self.defaults.base_url.as_deref(), &url),
            file_path,
            name,
            form_data,
            header: self.transfer_header(header),
            timeout,
        };
        tracing::debug!(
            target: LOG_TARGET,
            url = %request.url,
            file = %request.file_path,
            "uploading file"
        );

        let registration = self
            .registry
            .register(request_id.unwrap_or_else(generate_request_id));
        let transport = &self.transport;
        run_attempt(&registration, timeout, move |complete| {
            transport.upload(request, complete)
        })
        .await
    }

    /// Download a resource to a temporary file.
    ///
    /// Bypasses interceptors, retry and the loading indicator. Failures are
    /// returned as the transport reported them.
    pub async fn download(
        &self,
        options: DownloadOptions,
    ) -> Result<DownloadResponse, RequestError> {
        let DownloadOptions {
            url,
            header,
            timeout,
            request_id,
        } = options;
        let timeout = self.transfer_timeout(timeout);
        let request = DownloadRequest {
            url: resolve_url(self.defaults.base_url.as_deref(), &url),
            header: self.transfer_header(header),
            timeout,
        };
        tracing::debug!(target: LOG_TARGET, url = %request.url, "downloading file");

        let registration = self
            .registry
            .register(request_id.unwrap_or_else(generate_request_id));
        let transport = &self.transport;
        run_attempt(&registration, timeout, move |complete| {
            transport.download(request, complete)
        })
        .await
    }

    /// Default headers without `Content-Type`, overlaid with `header`.
    fn transfer_header(&self, header: HashMap<String, String>) -> HashMap<String, String> {
        let mut merged: HashMap<String, String> = self
            .defaults
            .header
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_TYPE))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        merged.extend(header);
        merged
    }

    fn transfer_timeout(&self, timeout: Option<Duration>) -> Option<Duration> {
        let timeout = timeout.unwrap_or(self.defaults.timeout);
        (!timeout.is_zero()).then_some(timeout)
    }

    /// Cancel the live call registered under `request_id`.
    ///
    /// Returns `false` if no such call is live.
    pub fn cancel(&self, request_id: &str) -> bool {
        self.registry.cancel(request_id)
    }

    /// Cancel every live call of this client.
    pub fn cancel_all(&self) {
        self.registry.cancel_all();
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new(RequestOptions::default())
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("defaults", &self.defaults)
            .field("interceptors", &self.interceptors)
            .field("loading", &self.loading)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Create an independent client over the default transport.
pub fn create_request(options: RequestOptions) -> Request {
    Request::new(options)
}

static DEFAULT_REQUEST: OnceLock<Request> = OnceLock::new();

/// Process-wide default client, created on first use.
pub fn request() -> &'static Request {
    DEFAULT_REQUEST.get_or_init(Request::default)
}
