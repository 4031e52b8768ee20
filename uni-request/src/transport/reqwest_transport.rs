//! Default transport backed by `reqwest`.
//!
//! Every operation runs on its own tokio task; aborting the task handle aborts
//! that task, which drops the completion without invoking it. Any HTTP status
//! is reported as a successful completion, only connection-level failures are
//! errors.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use reqwest::RequestBuilder;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use tokio::task::AbortHandle;
use uni_request_spec::transform::{transform_request, transform_response};
use uni_request_spec::{
    DataType, DownloadResponse, FORM_URLENCODED, Method, RequestData, RequestError,
    RequestResponse, ResponseData, ResponseType, UploadResponse,
};

use super::{Completion, DownloadRequest, TaskHandle, Transport, TransportRequest, UploadRequest};

/// [`Transport`] over a shared `reqwest::Client`.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn request(
        &self,
        request: TransportRequest,
        complete: Completion<RequestResponse>,
    ) -> Arc<dyn TaskHandle> {
        spawn(send_request(self.client.clone(), request), complete)
    }

    fn upload(
        &self,
        request: UploadRequest,
        complete: Completion<UploadResponse>,
    ) -> Arc<dyn TaskHandle> {
        spawn(send_upload(self.client.clone(), request), complete)
    }

    fn download(
        &self,
        request: DownloadRequest,
        complete: Completion<DownloadResponse>,
    ) -> Arc<dyn TaskHandle> {
        spawn(send_download(self.client.clone(), request), complete)
    }
}

struct SpawnedTask(AbortHandle);

impl TaskHandle for SpawnedTask {
    fn abort(&self) {
        self.0.abort();
    }
}

fn spawn<T, F>(operation: F, complete: Completion<T>) -> Arc<dyn TaskHandle>
where
    T: Send + 'static,
    F: Future<Output = Result<T, RequestError>> + Send + 'static,
{
    let handle = tokio::spawn(async move { complete(operation.await) });
    Arc::new(SpawnedTask(handle.abort_handle()))
}

async fn send_request(
    client: reqwest::Client,
    request: TransportRequest,
) -> Result<RequestResponse, RequestError> {
    let mut builder = client.request(reqwest_method(request.method), request_url(&request));
    builder = apply_headers(builder, &request.header);
    if let Some(timeout) = request.timeout {
        builder = builder.timeout(timeout);
    }
    builder = apply_body(builder, &request)?;

    let response = builder
        .send()
        .await
        .map_err(|e| transport_error("request", e))?;
    let status_code = response.status().as_u16();
    let (header, cookies) = collect_headers(response.headers());
    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error("request", e))?;

    Ok(RequestResponse {
        data: decode_body(body, request.data_type, request.response_type),
        status_code,
        header,
        cookies,
        profile: None,
    })
}

async fn send_upload(
    client: reqwest::Client,
    request: UploadRequest,
) -> Result<UploadResponse, RequestError> {
    let UploadRequest {
        url,
        file_path,
        name,
        form_data,
        header,
        timeout,
    } = request;

    let contents = tokio::fs::read(&file_path)
        .await
        .map_err(|e| RequestError::transport(format!("uploadFile:fail {e}")))?;
    let file_name = Path::new(&file_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.clone());

    let mut form = Form::new().part(name, Part::bytes(contents).file_name(file_name));
    for (key, value) in form_data {
        form = form.text(key, value);
    }

    let mut builder = apply_headers(client.post(&url), &header).multipart(form);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| transport_error("uploadFile", e))?;
    let status_code = response.status().as_u16();
    let (header, _) = collect_headers(response.headers());
    let data = response
        .text()
        .await
        .map_err(|e| transport_error("uploadFile", e))?;

    Ok(UploadResponse {
        data,
        status_code,
        header,
    })
}

async fn send_download(
    client: reqwest::Client,
    request: DownloadRequest,
) -> Result<DownloadResponse, RequestError> {
    let mut builder = apply_headers(client.get(&request.url), &request.header);
    if let Some(timeout) = request.timeout {
        builder = builder.timeout(timeout);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| transport_error("downloadFile", e))?;
    let status_code = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error("downloadFile", e))?;

    let path = temp_file_path(&request.url);
    tokio::fs::write(&path, &body)
        .await
        .map_err(|e| RequestError::transport(format!("downloadFile:fail {e}")))?;

    Ok(DownloadResponse {
        temp_file_path: path.to_string_lossy().into_owned(),
        status_code,
        profile: None,
    })
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Trace => reqwest::Method::TRACE,
        Method::Connect => reqwest::Method::CONNECT,
    }
}

/// GET/HEAD carry structured data in the query string.
fn request_url(request: &TransportRequest) -> String {
    match (&request.data, request.method.sends_data_as_query()) {
        (Some(RequestData::Json(data)), true) => {
            let query = transform_request::url_encoded(data);
            if query.is_empty() {
                request.url.clone()
            } else if request.url.contains('?') {
                format!("{}&{query}", request.url)
            } else {
                format!("{}?{query}", request.url)
            }
        }
        _ => request.url.clone(),
    }
}

fn apply_headers(mut builder: RequestBuilder, header: &HashMap<String, String>) -> RequestBuilder {
    for (name, value) in header {
        builder = builder.header(name, value);
    }
    builder
}

fn apply_body(
    builder: RequestBuilder,
    request: &TransportRequest,
) -> Result<RequestBuilder, RequestError> {
    let Some(data) = &request.data else {
        return Ok(builder);
    };
    Ok(match data {
        RequestData::Json(_) if request.method.sends_data_as_query() => builder,
        RequestData::Json(value) if is_form_urlencoded(&request.header) => {
            builder.body(transform_request::url_encoded(value))
        }
        RequestData::Json(value) => builder.body(
            transform_request::json(value)
                .map_err(|e| RequestError::transport(format!("request:fail {e}")))?,
        ),
        RequestData::Text(text) => builder.body(text.clone()),
        RequestData::Binary(bytes) => builder.body(bytes.clone()),
    })
}

fn is_form_urlencoded(header: &HashMap<String, String>) -> bool {
    header.iter().any(|(name, value)| {
        name.eq_ignore_ascii_case("content-type") && value.starts_with(FORM_URLENCODED)
    })
}

fn collect_headers(headers: &HeaderMap) -> (HashMap<String, String>, Vec<String>) {
    let mut collected: HashMap<String, String> = HashMap::new();
    let mut cookies = Vec::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        if *name == SET_COOKIE {
            cookies.push(value.clone());
        }
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    (collected, cookies)
}

fn decode_body(body: Bytes, data_type: DataType, response_type: ResponseType) -> ResponseData {
    if response_type == ResponseType::ArrayBuffer {
        return transform_response::array_buffer(ResponseData::Binary(body));
    }
    if body.is_empty() && data_type == DataType::Json {
        return ResponseData::null();
    }
    let text = ResponseData::Text(String::from_utf8_lossy(&body).into_owned());
    match data_type {
        DataType::Json => transform_response::json(text),
        DataType::Other => text,
    }
}

fn transport_error(operation: &str, err: reqwest::Error) -> RequestError {
    let message = if err.is_timeout() {
        format!("{operation}:fail timeout")
    } else {
        format!("{operation}:fail {err}")
    };
    let error = RequestError::transport(message);
    match err.status() {
        Some(status) => error.with_status_code(status.as_u16()),
        None => error,
    }
}

/// Fresh path in the system temp dir, keeping the URL's file extension.
fn temp_file_path(url: &str) -> PathBuf {
    let extension = url
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    let id = uuid::Uuid::new_v4();
    let file_name = match extension {
        Some(ext) => format!("uni-request-{id}.{ext}"),
        None => format!("uni-request-{id}"),
    };
    std::env::temp_dir().join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transport_request(method: Method, data: Option<RequestData>) -> TransportRequest {
        TransportRequest {
            url: "https://api.example.com/users".into(),
            method,
            data,
            header: HashMap::new(),
            timeout: None,
            data_type: DataType::Json,
            response_type: ResponseType::Text,
        }
    }

    #[test]
    fn get_data_goes_to_query_string() {
        let request = transport_request(Method::Get, Some(json!({"q": "a b", "page": 2}).into()));
        assert_eq!(
            request_url(&request),
            "https://api.example.com/users?q=a%20b&page=2"
        );

        let mut with_query = request.clone();
        with_query.url.push_str("?sort=asc");
        assert_eq!(
            request_url(&with_query),
            "https://api.example.com/users?sort=asc&q=a%20b&page=2"
        );
    }

    #[test]
    fn post_data_stays_in_body() {
        let request = transport_request(Method::Post, Some(json!({"name": "test"}).into()));
        assert_eq!(request_url(&request), "https://api.example.com/users");
    }

    #[test]
    fn decode_body_respects_types() {
        let body = Bytes::from_static(br#"{"a":1}"#);
        assert_eq!(
            decode_body(body.clone(), DataType::Json, ResponseType::Text),
            ResponseData::Json(json!({"a": 1}))
        );
        assert_eq!(
            decode_body(body.clone(), DataType::Other, ResponseType::Text),
            ResponseData::Text(r#"{"a":1}"#.into())
        );
        assert_eq!(
            decode_body(body.clone(), DataType::Json, ResponseType::ArrayBuffer),
            ResponseData::Binary(body)
        );
        assert_eq!(
            decode_body(Bytes::from_static(b"not json"), DataType::Json, ResponseType::Text),
            ResponseData::Text("not json".into())
        );
        assert_eq!(
            decode_body(Bytes::new(), DataType::Json, ResponseType::Text),
            ResponseData::null()
        );
        assert_eq!(
            decode_body(Bytes::new(), DataType::Other, ResponseType::Text),
            ResponseData::Text(String::new())
        );
    }

    #[test]
    fn temp_file_path_keeps_extension() {
        let path = temp_file_path("https://cdn.example.com/download/test.jpg?sig=1");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert!(path.starts_with(std::env::temp_dir()));

        let bare = temp_file_path("https://cdn.example.com/download/");
        assert_eq!(bare.extension(), None);
    }

    #[test]
    fn form_content_type_detection_is_case_insensitive() {
        let header = HashMap::from([(
            "content-type".to_string(),
            format!("{FORM_URLENCODED}; charset=utf-8"),
        )]);
        assert!(is_form_urlencoded(&header));
        assert!(!is_form_urlencoded(&HashMap::new()));
    }
}
