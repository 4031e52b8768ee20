//! File upload and download descriptors.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

/// Options for a multipart file upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOptions {
    pub url: String,
    /// Local path of the file to send.
    pub file_path: String,
    /// Multipart field name of the file.
    pub name: String,
    /// Extra text fields sent alongside the file.
    pub form_data: HashMap<String, String>,
    pub header: HashMap<String, String>,
    /// Overrides the client's default timeout; zero disables it.
    pub timeout: Option<Duration>,
    pub request_id: Option<String>,
}

impl UploadOptions {
    pub fn new(
        url: impl Into<String>,
        file_path: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            file_path: file_path.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_data.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Options for a file download.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadOptions {
    pub url: String,
    pub header: HashMap<String, String>,
    pub timeout: Option<Duration>,
    pub request_id: Option<String>,
}

impl DownloadOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Settled upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadResponse {
    /// Server reply body as text.
    pub data: String,
    pub status_code: u16,
    pub header: HashMap<String, String>,
}

/// Settled download.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadResponse {
    /// Local path the body was written to.
    pub temp_file_path: String,
    pub status_code: u16,
    pub profile: Option<Value>,
}
