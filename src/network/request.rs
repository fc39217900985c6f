//! Request and response types exchanged with the search API

use std::collections::HashMap;

/// HTTP request to be made against the search API
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// URL to request, already carrying any query string
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Multipart file attached to a POST
    pub file: Option<FilePart>,
}

impl ApiRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            file: None,
        }
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            headers: HashMap::new(),
            file: None,
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Attach a single-file multipart body
    pub fn multipart(mut self, part: FilePart) -> Self {
        self.file = Some(part);
        self
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One file field of a multipart form
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name (`audio`, `image`)
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }
}

/// HTTP response from the search API
#[derive(Debug)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Canonical reason phrase for the status, if any
    pub reason: Option<String>,
    /// Response body as text
    pub text: String,
}

impl ApiResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.text)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
