//! Client for the three search endpoints

use super::fallback::{FallbackGenerator, IMAGE_PLACEHOLDER_QUERY, VOICE_PLACEHOLDER_QUERY};
use super::models::{ApiErrorResponse, SearchQuery, SearchResponse, SearchType};
use crate::capture::{ImageFile, VoicePayload};
use crate::config::ApiSettings;
use crate::error::TransportError;
use crate::network::{ApiRequest, ApiResponse, FilePart, HttpClient};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Anything that can answer a captured search query.
///
/// Implementations always produce a response; failures are absorbed.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> SearchResponse;
}

/// Resolved endpoint URLs
#[derive(Debug, Clone)]
struct Endpoints {
    text: Url,
    voice: Url,
    image: Url,
}

impl Endpoints {
    fn from_settings(api: &ApiSettings) -> Result<Self, url::ParseError> {
        let base = Url::parse(&api.base_url)?;
        Ok(Self {
            text: base.join(&api.text_search_path)?,
            voice: base.join(&api.voice_search_path)?,
            image: base.join(&api.image_search_path)?,
        })
    }
}

/// Talks to the search API, falling back to mock data on any failure
pub struct SearchClient {
    http: HttpClient,
    endpoints: Endpoints,
    fallback: FallbackGenerator,
}

impl SearchClient {
    /// Create a client for the API described by `api`
    pub fn new(http: HttpClient, api: &ApiSettings) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            endpoints: Endpoints::from_settings(api)?,
            fallback: FallbackGenerator::new(),
        })
    }

    /// Replace the fallback generator, e.g. with a seeded one
    pub fn with_fallback(mut self, fallback: FallbackGenerator) -> Self {
        self.fallback = fallback;
        self
    }

    /// Search by text. `query` should already be trimmed and non-empty.
    pub async fn text_search(&self, query: &str) -> SearchResponse {
        let url = format!("{}?q={}", self.endpoints.text, urlencoding::encode(query));
        let request = ApiRequest::get(url).header("Content-Type", "application/json");

        self.send_or_fallback(request, query, SearchType::Text).await
    }

    /// Search by recorded audio
    pub async fn voice_search(&self, audio: &VoicePayload) -> SearchResponse {
        let request = ApiRequest::post(self.endpoints.voice.as_str()).multipart(FilePart::new(
            "audio",
            audio.file_name(),
            audio.mime.clone(),
            audio.bytes.clone(),
        ));

        self.send_or_fallback(request, VOICE_PLACEHOLDER_QUERY, SearchType::Voice)
            .await
    }

    /// Search by image
    pub async fn image_search(&self, image: &ImageFile) -> SearchResponse {
        let request = ApiRequest::post(self.endpoints.image.as_str()).multipart(FilePart::new(
            "image",
            image.name.clone(),
            image.mime.clone(),
            image.bytes.clone(),
        ));

        self.send_or_fallback(request, IMAGE_PLACEHOLDER_QUERY, SearchType::Image)
            .await
    }

    async fn send_or_fallback(
        &self,
        request: ApiRequest,
        fallback_query: &str,
        search_type: SearchType,
    ) -> SearchResponse {
        let start = Instant::now();

        let result = match self.http.execute(request).await {
            Ok(response) => Self::handle_response(response),
            Err(e) => Err(TransportError::from(e)),
        };

        match result {
            Ok(response) => {
                debug!(
                    "{} search returned {} results in {:?}",
                    search_type,
                    response.results.len(),
                    start.elapsed()
                );
                response
            }
            Err(e) => {
                warn!("{} search API error, using mock data: {}", search_type, e);
                self.fallback.generate(fallback_query, search_type)
            }
        }
    }

    /// Decode a reply, turning non-2xx statuses into errors
    fn handle_response(response: ApiResponse) -> Result<SearchResponse, TransportError> {
        if !response.is_success() {
            let message = match response.json::<ApiErrorResponse>() {
                Ok(body) if !body.error.is_empty() => body.error,
                Ok(_) => "Unknown error occurred".to_string(),
                Err(_) => format!(
                    "API Error: {} {}",
                    response.status,
                    response.reason.as_deref().unwrap_or_default()
                ),
            };
            return Err(TransportError::Status {
                status: response.status,
                message,
            });
        }

        Ok(response.json::<SearchResponse>()?)
    }
}

#[async_trait]
impl SearchService for SearchClient {
    async fn search(&self, query: &SearchQuery) -> SearchResponse {
        info!("Dispatching {} search", query.search_type());
        match query {
            SearchQuery::Text(text) => self.text_search(text).await,
            SearchQuery::Voice(audio) => self.voice_search(audio).await,
            SearchQuery::Image(image) => self.image_search(image).await,
        }
    }
}
