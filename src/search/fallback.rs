//! Locally generated responses used when the search API is unreachable
//!
//! Structure is fixed: five results, the [`FALLBACK_SEARCH_TIME`] sentinel,
//! and the invoking modality. Category and tag are drawn from a random
//! source, so values are only reproducible with a seeded generator.

use super::models::{SearchResponse, SearchResult, SearchType, FALLBACK_SEARCH_TIME};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Number of synthetic results in every fallback response
pub const FALLBACK_RESULT_COUNT: usize = 5;

pub const FALLBACK_CATEGORIES: [&str; 5] = ["Festival", "Tradition", "Cuisine", "Art", "History"];
pub const FALLBACK_TAGS: [&str; 5] = ["Assam", "Culture", "Heritage", "India", "Northeast"];

const SOURCE_URL: &str = "https://example.com/assamese-culture";
const PLACEHOLDER_IMAGE_URL: &str =
    "https://via.placeholder.com/300x200/205295/FFFFFF?text=Assamese+Culture";

/// Query echoed by voice fallbacks; there is no transcription client-side
pub const VOICE_PLACEHOLDER_QUERY: &str = "voice query example";
/// Query echoed by image fallbacks
pub const IMAGE_PLACEHOLDER_QUERY: &str = "image search example";

/// Builds mock responses from an injectable random source
pub struct FallbackGenerator {
    rng: Mutex<StdRng>,
}

impl FallbackGenerator {
    /// Generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Generator with a fixed seed, for reproducible output
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generate a mock response for `query`
    pub fn generate(&self, query: &str, search_type: SearchType) -> SearchResponse {
        let date = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let flavour = match search_type {
            SearchType::Image => "Visual",
            _ => "Cultural",
        };

        // A poisoned lock still holds a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());

        let results: Vec<SearchResult> = (0..FALLBACK_RESULT_COUNT)
            .map(|index| {
                let category = FALLBACK_CATEGORIES[rng.gen_range(0..FALLBACK_CATEGORIES.len())];
                let tag = FALLBACK_TAGS[rng.gen_range(0..FALLBACK_TAGS.len())];

                let result = SearchResult::new(
                    format!("mock-{}-{}", search_type, index),
                    format!(
                        "Assamese {} Result #{} for \"{}\"",
                        flavour,
                        index + 1,
                        query
                    ),
                    format!(
                        "This is a sample result for your {} search about Assamese culture. \
                         This would contain relevant information about traditions, history, \
                         or artifacts related to your query.",
                        search_type
                    ),
                )
                .with_source_url(SOURCE_URL)
                .with_date(date.clone())
                .with_category(category)
                .with_tag(tag);

                if search_type == SearchType::Image {
                    result.with_image_url(PLACEHOLDER_IMAGE_URL)
                } else {
                    result
                }
            })
            .collect();

        SearchResponse {
            total_results: results.len() as u64,
            results,
            search_time: Some(FALLBACK_SEARCH_TIME),
            query: query.to_string(),
            search_type,
        }
    }
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new()
    }
}
