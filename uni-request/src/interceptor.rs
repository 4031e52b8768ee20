//! Interceptor chains
//!
//! Each client owns two independent chains: a request stage that may rewrite
//! the config before dispatch, and a response stage that may rewrite the
//! response or recover from (or replace) a failure.
//!
//! Handlers are kept in an ordered map keyed by a per-chain monotonically
//! increasing [`InterceptorId`], so ejecting one is a single removal and never
//! disturbs the order of the rest.
//!
//! Ordering:
//! - request stage runs newest-first and stops at the first error;
//! - response stage runs oldest-first with promise-chain semantics, so an
//!   error is handed to the next handler's [`Interceptor::on_rejected`].

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::BoxFuture;
use uni_request_spec::{RequestConfig, RequestError, RequestResponse};

use crate::utils::lock;

const LOG_TARGET: &str = "uni_request::http";

/// One interceptor stage handler.
///
/// Both hooks default to passing their input through unchanged.
#[async_trait]
pub trait Interceptor<T: Send + 'static>: Send + Sync {
    async fn on_fulfilled(&self, value: T) -> Result<T, RequestError> {
        Ok(value)
    }

    /// Only consulted by the response stage.
    async fn on_rejected(&self, error: RequestError) -> Result<T, RequestError> {
        Err(error)
    }
}

type FulfilledFn<T> = Box<dyn Fn(T) -> BoxFuture<'static, Result<T, RequestError>> + Send + Sync>;
type RejectedFn<T> =
    Box<dyn Fn(RequestError) -> BoxFuture<'static, Result<T, RequestError>> + Send + Sync>;

/// Interceptor built from closures.
pub struct FnInterceptor<T> {
    fulfilled: Option<FulfilledFn<T>>,
    rejected: Option<RejectedFn<T>>,
}

impl<T: Send + 'static> FnInterceptor<T> {
    pub fn new() -> Self {
        Self {
            fulfilled: None,
            rejected: None,
        }
    }

    pub fn with_fulfilled<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
    {
        self.fulfilled = Some(Box::new(move |value| Box::pin(handler(value))));
        self
    }

    pub fn with_rejected<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(RequestError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
    {
        self.rejected = Some(Box::new(move |error| Box::pin(handler(error))));
        self
    }
}

impl<T: Send + 'static> Default for FnInterceptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Interceptor<T> for FnInterceptor<T> {
    async fn on_fulfilled(&self, value: T) -> Result<T, RequestError> {
        match &self.fulfilled {
            Some(handler) => handler(value).await,
            None => Ok(value),
        }
    }

    async fn on_rejected(&self, error: RequestError) -> Result<T, RequestError> {
        match &self.rejected {
            Some(handler) => handler(error).await,
            None => Err(error),
        }
    }
}

/// Handle returned by registration, used to eject the handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InterceptorId(u64);

impl InterceptorId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

struct Chain<T: Send + 'static> {
    next_id: u64,
    handlers: BTreeMap<InterceptorId, Arc<dyn Interceptor<T>>>,
}

/// Ordered, mutable chain of interceptors for one stage.
pub struct InterceptorManager<T: Send + 'static> {
    chain: Mutex<Chain<T>>,
}

impl<T: Send + 'static> InterceptorManager<T> {
    pub fn new() -> Self {
        Self {
            chain: Mutex::new(Chain {
                next_id: 0,
                handlers: BTreeMap::new(),
            }),
        }
    }

    /// Append `interceptor` to the chain.
    pub fn use_interceptor<I>(&self, interceptor: I) -> InterceptorId
    where
        I: Interceptor<T> + 'static,
    {
        self.use_shared(Arc::new(interceptor))
    }

    pub fn use_shared(&self, interceptor: Arc<dyn Interceptor<T>>) -> InterceptorId {
        let mut chain = lock(&self.chain);
        let id = InterceptorId(chain.next_id);
        chain.next_id += 1;
        chain.handlers.insert(id, interceptor);
        id
    }

    /// Append an async fulfilled-handler.
    pub fn use_fn<F, Fut>(&self, fulfilled: F) -> InterceptorId
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
    {
        self.use_interceptor(FnInterceptor::new().with_fulfilled(fulfilled))
    }

    /// Append a fulfilled/rejected handler pair.
    pub fn use_fns<F, FutF, R, FutR>(&self, fulfilled: F, rejected: R) -> InterceptorId
    where
        F: Fn(T) -> FutF + Send + Sync + 'static,
        FutF: Future<Output = Result<T, RequestError>> + Send + 'static,
        R: Fn(RequestError) -> FutR + Send + Sync + 'static,
        FutR: Future<Output = Result<T, RequestError>> + Send + 'static,
    {
        self.use_interceptor(
            FnInterceptor::new()
                .with_fulfilled(fulfilled)
                .with_rejected(rejected),
        )
    }

    /// Append a handler that only sees failures.
    pub fn use_rejected<R, Fut>(&self, rejected: R) -> InterceptorId
    where
        R: Fn(RequestError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, RequestError>> + Send + 'static,
    {
        self.use_interceptor(FnInterceptor::new().with_rejected(rejected))
    }

    /// Append a synchronous fulfilled-handler.
    pub fn use_sync<F>(&self, fulfilled: F) -> InterceptorId
    where
        F: Fn(T) -> Result<T, RequestError> + Send + Sync + 'static,
    {
        self.use_fn(move |value| std::future::ready(fulfilled(value)))
    }

    /// Remove a handler. Unknown or already-ejected ids are ignored.
    pub fn eject(&self, id: InterceptorId) {
        lock(&self.chain).handlers.remove(&id);
    }

    pub fn clear(&self) {
        lock(&self.chain).handlers.clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.chain).handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.chain).handlers.is_empty()
    }

    /// Handlers in registration order, detached from the lock.
    fn snapshot(&self) -> Vec<Arc<dyn Interceptor<T>>> {
        lock(&self.chain).handlers.values().cloned().collect()
    }

    /// Newest-first, stopping at the first error.
    pub(crate) async fn run_reverse(&self, value: T) -> Result<T, RequestError> {
        let mut value = value;
        for handler in self.snapshot().into_iter().rev() {
            value = handler.on_fulfilled(value).await?;
        }
        Ok(value)
    }

    /// Oldest-first, routing each outcome to the matching hook.
    pub(crate) async fn run_forward(
        &self,
        outcome: Result<T, RequestError>,
    ) -> Result<T, RequestError> {
        let mut outcome = outcome;
        for handler in self.snapshot() {
            outcome = match outcome {
                Ok(value) => handler.on_fulfilled(value).await,
                Err(error) => handler.on_rejected(error).await,
            };
        }
        outcome
    }
}

impl<T: Send + 'static> Default for InterceptorManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> std::fmt::Debug for InterceptorManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<InterceptorId> = lock(&self.chain).handlers.keys().copied().collect();
        f.debug_struct("InterceptorManager")
            .field("handlers", &ids)
            .finish()
    }
}

/// The two chains of one client.
#[derive(Debug, Default)]
pub struct Interceptors {
    pub request: InterceptorManager<RequestConfig>,
    pub response: InterceptorManager<RequestResponse>,
}

/// A simple logging interceptor backed by `tracing` (no header values).
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

#[async_trait]
impl Interceptor<RequestConfig> for LoggingInterceptor {
    async fn on_fulfilled(&self, config: RequestConfig) -> Result<RequestConfig, RequestError> {
        tracing::debug!(
            target: LOG_TARGET,
            method = %config.method,
            url = %config.url,
            request_id = ?config.request_id,
            retry = config.retry,
            "sending request"
        );
        Ok(config)
    }
}

#[async_trait]
impl Interceptor<RequestResponse> for LoggingInterceptor {
    async fn on_fulfilled(
        &self,
        response: RequestResponse,
    ) -> Result<RequestResponse, RequestError> {
        tracing::debug!(target: LOG_TARGET, status = response.status_code, "response received");
        Ok(response)
    }

    async fn on_rejected(&self, error: RequestError) -> Result<RequestResponse, RequestError> {
        tracing::debug!(
            target: LOG_TARGET,
            kind = ?error.kind,
            status = ?error.status_code,
            url = ?error.config().map(|c| c.url.as_str()),
            err = %error,
            "request error"
        );
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn recorder() -> Arc<StdMutex<Vec<&'static str>>> {
        Arc::new(StdMutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn request_stage_runs_newest_first() {
        let manager = InterceptorManager::<RequestConfig>::new();
        let calls = recorder();
        for name in ["first", "second", "third"] {
            let calls = calls.clone();
            manager.use_sync(move |config| {
                calls.lock().unwrap().push(name);
                Ok(config)
            });
        }

        manager.run_reverse(RequestConfig::default()).await.unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn request_stage_stops_at_first_error() {
        let manager = InterceptorManager::<RequestConfig>::new();
        let calls = recorder();
        let c = calls.clone();
        manager.use_sync(move |config| {
            c.lock().unwrap().push("older");
            Ok(config)
        });
        manager.use_sync(|_| Err(RequestError::interceptor("rejected")));

        let err = manager
            .run_reverse(RequestConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.err_msg, "rejected");
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn response_stage_recovers_through_rejected_hook() {
        let manager = InterceptorManager::<RequestResponse>::new();
        manager.use_sync(|_| Err(RequestError::interceptor("broken")));
        manager.use_rejected(|error| async move {
            Ok(RequestResponse::new(200, format!("recovered from {}", error.err_msg)))
        });

        let response = manager
            .run_forward(Ok(RequestResponse::new(200, "ok")))
            .await
            .unwrap();
        assert_eq!(response.data.as_text(), Some("recovered from broken"));
    }

    #[tokio::test]
    async fn response_stage_skips_fulfilled_hooks_on_error() {
        let manager = InterceptorManager::<RequestResponse>::new();
        let calls = recorder();
        let c = calls.clone();
        manager.use_sync(move |response| {
            c.lock().unwrap().push("fulfilled");
            Ok(response)
        });

        let err = manager
            .run_forward(Err(RequestError::transport("网络错误")))
            .await
            .unwrap_err();
        assert_eq!(err.err_msg, "网络错误");
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn eject_is_idempotent() {
        let manager = InterceptorManager::<RequestConfig>::new();
        let id = manager.use_sync(|_| Err(RequestError::interceptor("should not run")));
        assert_eq!(manager.len(), 1);

        manager.eject(id);
        manager.eject(id);
        manager.eject(InterceptorId(42));

        assert!(manager.is_empty());
        assert!(manager.run_reverse(RequestConfig::default()).await.is_ok());
    }

    #[test]
    fn ids_are_monotonic_per_chain() {
        let manager = InterceptorManager::<RequestConfig>::new();
        let a = manager.use_sync(Ok);
        manager.eject(a);
        let b = manager.use_sync(Ok);
        assert!(b > a);
        assert_eq!(b.value(), 1);

        let other = InterceptorManager::<RequestConfig>::new();
        assert_eq!(other.use_sync(Ok).value(), 0);
    }

    #[tokio::test]
    async fn logging_interceptor_passes_values_through() {
        let requests = InterceptorManager::<RequestConfig>::new();
        requests.use_interceptor(LoggingInterceptor);
        let config = RequestConfig::default();
        assert_eq!(requests.run_reverse(config.clone()).await.unwrap(), config);

        let responses = InterceptorManager::<RequestResponse>::new();
        responses.use_interceptor(LoggingInterceptor);
        let err = responses
            .run_forward(Err(RequestError::transport("boom")))
            .await
            .unwrap_err();
        assert_eq!(err.err_msg, "boom");
    }
}
