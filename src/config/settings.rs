//! Settings structures for heritage-search configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Main settings structure, mirrors `settings.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub api: ApiSettings,
    pub outgoing: OutgoingSettings,
    pub capture: CaptureSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (HERITAGE_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("HERITAGE_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("HERITAGE_API_URL") {
            self.api.base_url = val;
        }
        if let Ok(val) = std::env::var("HERITAGE_REQUEST_TIMEOUT") {
            if let Some(timeout) = parse_timeout(&val) {
                self.outgoing.request_timeout = timeout;
            }
        }
    }
}

/// A positive, finite number of seconds
fn parse_timeout(val: &str) -> Option<f64> {
    val.trim()
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite() && *t > 0.0)
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Name shown in the CLI banner
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "Assamese Cultural Search".to_string(),
        }
    }
}

/// Search API location and endpoint paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL the endpoint paths are joined onto
    pub base_url: String,
    pub text_search_path: String,
    pub voice_search_path: String,
    pub image_search_path: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            text_search_path: "/api/textSearch".to_string(),
            voice_search_path: "/api/voiceSearch".to_string(),
            image_search_path: "/api/imageSearch".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Request timeout in seconds
    pub request_timeout: f64,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send with every request
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 10.0,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Limits applied by the capture adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Hard ceiling on a single voice recording, in milliseconds
    pub max_recording_ms: u64,
    /// How long the "processing" indicator stays up after a recording
    pub processing_indicator_ms: u64,
    /// Largest accepted image upload, in bytes
    pub max_image_bytes: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            max_recording_ms: 8_000,
            processing_indicator_ms: 2_500,
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}
