//! Studio configuration
//!
//! Settings come from an optional JSON file, then environment variables
//! override individual fields.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};
use crate::generation::{ModelSelection, DEFAULT_API_URL, DEFAULT_TIMEOUT_MS};
use crate::history::MAX_HISTORY;

/// Default session file, relative to the working directory.
pub const DEFAULT_SESSION_PATH: &str = "scene-session.json";

/// Runtime configuration for a studio session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Versions retained per layer.
    pub max_history: usize,

    /// Image model; detected from the backend when unset.
    pub image_model: Option<String>,

    /// Text model; detected from the backend when unset.
    pub text_model: Option<String>,

    /// API key for the generation backend.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL of the generation REST API.
    pub api_base_url: String,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Where the scene session is saved between commands.
    pub session_path: PathBuf,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            max_history: MAX_HISTORY,
            image_model: None,
            text_model: None,
            api_key: None,
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
        }
    }
}

impl StudioConfig {
    /// Load from `path` (if given), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| StudioError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = serde_json::from_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `SCENE_STUDIO_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("SCENE_STUDIO_API_KEY").or_else(|| lookup("GEMINI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("SCENE_STUDIO_IMAGE_MODEL") {
            self.image_model = Some(model);
        }
        if let Some(model) = lookup("SCENE_STUDIO_TEXT_MODEL") {
            self.text_model = Some(model);
        }
        if let Some(url) = lookup("SCENE_STUDIO_API_URL") {
            self.api_base_url = url;
        }
        if let Some(value) = lookup("SCENE_STUDIO_TIMEOUT_MS") {
            self.request_timeout_ms = parse_number("SCENE_STUDIO_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("SCENE_STUDIO_MAX_HISTORY") {
            self.max_history = parse_number("SCENE_STUDIO_MAX_HISTORY", &value)?;
        }
        if let Some(path) = lookup("SCENE_STUDIO_SESSION") {
            self.session_path = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_history == 0 {
            return Err(StudioError::Config {
                reason: "max_history must be at least 1".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(StudioError::Config {
                reason: "request_timeout_ms must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// True when a non-blank API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Explicitly configured models layered over `detected`.
    pub fn models_over(&self, detected: ModelSelection) -> ModelSelection {
        ModelSelection {
            image_model: self.image_model.clone().unwrap_or(detected.image_model),
            text_model: self.text_model.clone().unwrap_or(detected.text_model),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| StudioError::Config {
        reason: format!("{} must be a number, got '{}'", key, value),
    })
}
