//! Scripted transport and loading indicator for client tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::task::AbortHandle;
use uni_request::{
    Completion, DownloadRequest, DownloadResponse, LoadingIndicator, LoadingOptions, Request,
    RequestError, RequestOptions, RequestResponse, TaskHandle, Transport, TransportRequest,
    UploadRequest, UploadResponse,
};

/// What the mock does with one transport call.
pub enum Reply<T> {
    Success(T),
    Failure(RequestError),
    /// Never complete; only abort or a timeout ends the call.
    Never,
}

type Responder<R, T> = Box<dyn Fn(usize, &R) -> Reply<T> + Send + Sync>;

pub struct MockTask {
    aborted: AtomicBool,
    handle: AbortHandle,
}

impl MockTask {
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

impl TaskHandle for MockTask {
    fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        self.handle.abort();
    }
}

/// Transport that answers from closures after a fixed delay.
pub struct MockTransport {
    responder: Responder<TransportRequest, RequestResponse>,
    upload_responder: Responder<UploadRequest, UploadResponse>,
    download_responder: Responder<DownloadRequest, DownloadResponse>,
    delay: Duration,
    calls: Mutex<Vec<TransportRequest>>,
    uploads: Mutex<Vec<UploadRequest>>,
    downloads: Mutex<Vec<DownloadRequest>>,
    tasks: Mutex<Vec<Arc<MockTask>>>,
}

impl MockTransport {
    /// Every call succeeds with `{"message": "success"}`.
    pub fn new() -> Self {
        Self {
            responder: Box::new(|_, _| {
                Reply::Success(RequestResponse::new(200, json!({"message": "success"})))
            }),
            upload_responder: Box::new(|_, _| {
                Reply::Success(UploadResponse {
                    data: "upload success".into(),
                    status_code: 200,
                    header: Default::default(),
                })
            }),
            download_responder: Box::new(|_, _| {
                Reply::Success(DownloadResponse {
                    temp_file_path: "temp://downloaded.jpg".into(),
                    status_code: 200,
                    profile: None,
                })
            }),
            delay: Duration::ZERO,
            calls: Mutex::default(),
            uploads: Mutex::default(),
            downloads: Mutex::default(),
            tasks: Mutex::default(),
        }
    }

    pub fn respond_with<F>(mut self, responder: F) -> Self
    where
        F: Fn(usize, &TransportRequest) -> Reply<RequestResponse> + Send + Sync + 'static,
    {
        self.responder = Box::new(responder);
        self
    }

    pub fn upload_with<F>(mut self, responder: F) -> Self
    where
        F: Fn(usize, &UploadRequest) -> Reply<UploadResponse> + Send + Sync + 'static,
    {
        self.upload_responder = Box::new(responder);
        self
    }

    pub fn download_with<F>(mut self, responder: F) -> Self
    where
        F: Fn(usize, &DownloadRequest) -> Reply<DownloadResponse> + Send + Sync + 'static,
    {
        self.download_responder = Box::new(responder);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every call fails with `error`.
    pub fn failing(error: RequestError) -> Self {
        Self::new().respond_with(move |_, _| Reply::Failure(error.clone()))
    }

    /// No call ever completes.
    pub fn hanging() -> Self {
        Self::new().respond_with(|_, _| Reply::Never)
    }

    pub fn calls(&self) -> Vec<TransportRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> TransportRequest {
        self.calls.lock().unwrap().last().cloned().expect("no transport call")
    }

    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<DownloadRequest> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn tasks(&self) -> Vec<Arc<MockTask>> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn aborted_count(&self) -> usize {
        self.tasks().iter().filter(|t| t.is_aborted()).count()
    }

    fn deliver<T: Send + 'static>(
        &self,
        reply: Reply<T>,
        complete: Completion<T>,
    ) -> Arc<dyn TaskHandle> {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match reply {
                Reply::Success(value) => complete(Ok(value)),
                Reply::Failure(error) => complete(Err(error)),
                Reply::Never => {
                    let _parked = complete;
                    std::future::pending::<()>().await;
                }
            }
        });
        let task = Arc::new(MockTask {
            aborted: AtomicBool::new(false),
            handle: handle.abort_handle(),
        });
        self.tasks.lock().unwrap().push(task.clone());
        task
    }
}

impl Transport for MockTransport {
    fn request(
        &self,
        request: TransportRequest,
        complete: Completion<RequestResponse>,
    ) -> Arc<dyn TaskHandle> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.clone());
            calls.len() - 1
        };
        self.deliver((self.responder)(index, &request), complete)
    }

    fn upload(
        &self,
        request: UploadRequest,
        complete: Completion<UploadResponse>,
    ) -> Arc<dyn TaskHandle> {
        let index = {
            let mut uploads = self.uploads.lock().unwrap();
            uploads.push(request.clone());
            uploads.len() - 1
        };
        self.deliver((self.upload_responder)(index, &request), complete)
    }

    fn download(
        &self,
        request: DownloadRequest,
        complete: Completion<DownloadResponse>,
    ) -> Arc<dyn TaskHandle> {
        let index = {
            let mut downloads = self.downloads.lock().unwrap();
            downloads.push(request.clone());
            downloads.len() - 1
        };
        self.deliver((self.download_responder)(index, &request), complete)
    }
}

/// Loading indicator that records every show and hide.
#[derive(Default)]
pub struct CountingIndicator {
    shown: Mutex<Vec<LoadingOptions>>,
    hides: AtomicUsize,
}

impl CountingIndicator {
    pub fn shows(&self) -> Vec<LoadingOptions> {
        self.shown.lock().unwrap().clone()
    }

    pub fn show_count(&self) -> usize {
        self.shown.lock().unwrap().len()
    }

    pub fn hide_count(&self) -> usize {
        self.hides.load(Ordering::SeqCst)
    }
}

impl LoadingIndicator for CountingIndicator {
    fn show(&self, options: &LoadingOptions) {
        self.shown.lock().unwrap().push(options.clone());
    }

    fn hide(&self) {
        self.hides.fetch_add(1, Ordering::SeqCst);
    }
}

/// Client wired to `transport` and a fresh counting indicator.
pub fn client(
    options: RequestOptions,
    transport: MockTransport,
) -> (Request, Arc<MockTransport>, Arc<CountingIndicator>) {
    let transport = Arc::new(transport);
    let indicator = Arc::new(CountingIndicator::default());
    let request = Request::with_transport(options, transport.clone(), indicator.clone());
    (request, transport, indicator)
}
