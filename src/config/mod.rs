//! Configuration module for heritage-search
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_ENV: &str = "HERITAGE_SETTINGS_PATH";

/// Find the settings file to use, if any
pub fn locate() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
    }

    let candidates = [
        Some(PathBuf::from("settings.yml")),
        Some(PathBuf::from("config/settings.yml")),
        dirs::config_dir().map(|p| p.join("heritage-search/settings.yml")),
    ];

    candidates.into_iter().flatten().find(|p| p.is_file())
}

/// Load settings from `path`, or defaults, then apply environment overrides
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    settings.merge_env();
    Ok(settings)
}
