//! HTTP networking module
//!
//! Provides HTTP client functionality for talking to the search API.

mod client;
mod request;

pub use client::HttpClient;
pub use request::{ApiRequest, ApiResponse, FilePart, HttpMethod};
