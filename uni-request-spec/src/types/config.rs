//! Request configuration.
//!
//! `RequestOptions` is the sparse override bag callers hand to a client,
//! either at construction (instance defaults) or per call. `RequestConfig` is
//! the concrete, fully-resolved configuration a call runs with.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::data::RequestData;
use crate::url::resolve_url;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);
/// Default pause between retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1_000);
/// Default loading indicator title.
pub const DEFAULT_LOADING_TEXT: &str = "加载中...";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Trace,
    Connect,
}

impl Method {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Connect => "CONNECT",
        }
    }

    /// Methods whose structured data travels in the query string.
    pub const fn sends_data_as_query(&self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the response body is interpreted once received as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum DataType {
    /// Try to parse the body as JSON, keeping the raw text on failure.
    #[default]
    Json,
    /// Keep the body as text.
    Other,
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Other
        }
    }
}

/// Shape the transport should deliver the body in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Text,
    #[serde(alias = "arrayBuffer")]
    ArrayBuffer,
}

/// Fully-resolved configuration for one call (or a client's defaults).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub base_url: Option<String>,
    pub url: String,
    pub method: Method,
    /// Header names are kept exactly as supplied.
    pub header: HashMap<String, String>,
    pub data: Option<RequestData>,
    pub data_type: DataType,
    pub response_type: ResponseType,
    /// Per-attempt timeout; zero disables it.
    pub timeout: Duration,
    /// Additional attempts after the first one fails.
    pub retry: u32,
    pub retry_delay: Duration,
    pub loading: bool,
    pub loading_text: String,
    pub request_id: Option<String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            url: String::new(),
            method: Method::Get,
            header: HashMap::from([(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())]),
            data: None,
            data_type: DataType::Json,
            response_type: ResponseType::Text,
            timeout: DEFAULT_TIMEOUT,
            retry: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            loading: false,
            loading_text: DEFAULT_LOADING_TEXT.to_string(),
            request_id: None,
        }
    }
}

impl RequestConfig {
    /// Shallow-merge `options` over `self`.
    ///
    /// Headers merge key by key, names compared ignoring ASCII case, with
    /// `options` winning; every other field is taken from `options` when
    /// present.
    pub fn merge(&self, options: RequestOptions) -> Self {
        let RequestOptions {
            base_url,
            url,
            method,
            header,
            data,
            data_type,
            response_type,
            timeout,
            retry,
            retry_delay,
            loading,
            loading_text,
            request_id,
        } = options;

        let mut merged_header = self.header.clone();
        for (name, value) in header {
            merged_header.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
            merged_header.insert(name, value);
        }

        Self {
            base_url: base_url.or_else(|| self.base_url.clone()),
            url: url.unwrap_or_else(|| self.url.clone()),
            method: method.unwrap_or(self.method),
            header: merged_header,
            data: data.or_else(|| self.data.clone()),
            data_type: data_type.unwrap_or(self.data_type),
            response_type: response_type.unwrap_or(self.response_type),
            timeout: timeout.unwrap_or(self.timeout),
            retry: retry.unwrap_or(self.retry),
            retry_delay: retry_delay.unwrap_or(self.retry_delay),
            loading: loading.unwrap_or(self.loading),
            loading_text: loading_text.unwrap_or_else(|| self.loading_text.clone()),
            request_id: request_id.or_else(|| self.request_id.clone()),
        }
    }

    /// Merge `options` over these defaults and resolve the URL against the
    /// effective base URL.
    pub fn resolve(&self, options: RequestOptions) -> Self {
        let mut config = self.merge(options);
        config.url = resolve_url(config.base_url.as_deref(), &config.url);
        config
    }

    /// The attempt timeout, or `None` when disabled.
    pub fn effective_timeout(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.header
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Sparse overrides for a [`RequestConfig`].
///
/// Field names follow the platform's JSON spelling so instance defaults can be
/// loaded with [`RequestOptions::from_json_str`]; durations are milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestOptions {
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
    pub url: Option<String>,
    pub method: Option<Method>,
    pub header: HashMap<String, String>,
    #[serde(deserialize_with = "deserialize_json_data")]
    pub data: Option<RequestData>,
    pub data_type: Option<DataType>,
    pub response_type: Option<ResponseType>,
    #[serde(deserialize_with = "deserialize_millis")]
    pub timeout: Option<Duration>,
    pub retry: Option<u32>,
    #[serde(deserialize_with = "deserialize_millis")]
    pub retry_delay: Option<Duration>,
    pub loading: Option<bool>,
    pub loading_text: Option<String>,
    pub request_id: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(name.into(), value.into());
        self
    }

    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.header
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_data(mut self, data: impl Into<RequestData>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Per-attempt timeout; `Duration::ZERO` disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn with_loading(mut self, loading: bool) -> Self {
        self.loading = Some(loading);
        self
    }

    pub fn with_loading_text(mut self, text: impl Into<String>) -> Self {
        self.loading_text = Some(text.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

fn deserialize_json_data<'de, D>(deserializer: D) -> Result<Option<RequestData>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.map(RequestData::Json))
}
