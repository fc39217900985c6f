//! Search client module
//!
//! Sends captured queries to the search API and degrades to locally
//! generated results when the API cannot answer.

mod client;
mod fallback;
mod models;

pub use client::{SearchClient, SearchService};
pub use fallback::{
    FallbackGenerator, FALLBACK_CATEGORIES, FALLBACK_RESULT_COUNT, FALLBACK_TAGS,
    IMAGE_PLACEHOLDER_QUERY, VOICE_PLACEHOLDER_QUERY,
};
pub use models::*;
