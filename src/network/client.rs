//! HTTP client for making requests to the search API

use super::request::{ApiRequest, ApiResponse, FilePart, HttpMethod};
use crate::config::OutgoingSettings;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Used when the configured timeout is not a usable duration
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client wrapper with heritage-search specific configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> reqwest::Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> reqwest::Result<Self> {
        let timeout = request_timeout(settings.request_timeout);
        let mut builder = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("heritage-search/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: timeout,
            extra_headers: settings.extra_headers.clone(),
        })
    }

    /// Execute an API request
    pub async fn execute(&self, request: ApiRequest) -> reqwest::Result<ApiResponse> {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder
            .timeout(self.default_timeout)
            .header("Accept", "application/json");

        for (key, value) in self.extra_headers.iter().chain(&request.headers) {
            req_builder = req_builder.header(key, value);
        }

        if let Some(file) = request.file {
            req_builder = req_builder.multipart(Self::build_form(file)?);
        }

        debug!("{:?} {}", request.method, request.url);
        let response = req_builder.send().await?;

        Self::parse_response(response).await
    }

    /// Wrap a single file into a multipart form
    fn build_form(file: FilePart) -> reqwest::Result<Form> {
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime)?;
        Ok(Form::new().part(file.field, part))
    }

    /// Parse response into ApiResponse
    async fn parse_response(response: Response) -> reqwest::Result<ApiResponse> {
        let status = response.status();
        let text = response.text().await?;

        Ok(ApiResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(String::from),
            text,
        })
    }
}

/// Convert a timeout in seconds, replacing negative, zero, NaN or huge values
fn request_timeout(secs: f64) -> Duration {
    match Duration::try_from_secs_f64(secs) {
        Ok(timeout) if !timeout.is_zero() => timeout,
        _ => {
            warn!(
                "Invalid request timeout {}, using {:?}",
                secs, FALLBACK_TIMEOUT
            );
            FALLBACK_TIMEOUT
        }
    }
}
