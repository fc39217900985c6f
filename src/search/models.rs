//! Search query, result and response models

use crate::capture::{ImageFile, VoicePayload};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Search time reported by locally generated fallback responses
pub const FALLBACK_SEARCH_TIME: f64 = 0.35;

/// Input modality of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Text,
    Voice,
    Image,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::Image => "image",
        }
    }

    /// Human readable label, e.g. "Voice Search"
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "Text Search",
            Self::Voice => "Voice Search",
            Self::Image => "Image Search",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured, validated search input
#[derive(Debug, Clone)]
pub enum SearchQuery {
    /// Trimmed, non-empty query text
    Text(String),
    /// Recorded audio
    Voice(VoicePayload),
    /// Accepted image upload
    Image(ImageFile),
}

impl SearchQuery {
    pub fn search_type(&self) -> SearchType {
        match self {
            Self::Text(_) => SearchType::Text,
            Self::Voice(_) => SearchType::Voice,
            Self::Image(_) => SearchType::Image,
        }
    }
}

/// A single search result as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
}

impl SearchResult {
    /// Create a new result
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            image_url: None,
            source_url: None,
            date: None,
            category: None,
            tags: None,
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Add a tag; duplicates collapse
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(BTreeSet::new).insert(tag.into());
        self
    }
}

/// Complete response for one search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Results in relevance order
    pub results: Vec<SearchResult>,
    /// Total matches known to the backend, may exceed `results.len()`
    pub total_results: u64,
    /// Backend search time in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_time: Option<f64>,
    /// Echo of the query, or a placeholder for voice and image searches
    pub query: String,
    pub search_type: SearchType,
}

impl SearchResponse {
    /// Whether this response carries the fallback sentinel search time
    pub fn is_fallback(&self) -> bool {
        self.search_time == Some(FALLBACK_SEARCH_TIME)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Error body returned by the API with non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
