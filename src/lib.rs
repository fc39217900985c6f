//! heritage-search: text, voice and image search over the Assamese
//! cultural heritage collection
//!
//! Captured input is validated per modality, sent to the search API, and
//! answered with locally generated results whenever the API cannot answer.

pub mod capture;
pub mod config;
pub mod error;
pub mod network;
pub mod notify;
pub mod orchestrator;
pub mod search;

pub use config::Settings;
pub use error::{CaptureError, TransportError};
pub use orchestrator::{SearchOrchestrator, SessionState, View};
pub use search::{SearchClient, SearchQuery, SearchResponse, SearchResult, SearchType};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
