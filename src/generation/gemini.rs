//! Gemini generation backend
//!
//! Talks to the `generateContent` REST endpoint. Request/response shaping is
//! always compiled; the HTTP transport needs the `gemini` feature.

use std::env;

use serde::{Deserialize, Serialize};

use super::artifact::Artifact;
use super::model::{GenerationService, ImageRequest, ServiceInfo, TextRequest};
use crate::error::{Result, StudioError};

/// Default REST endpoint.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default per-request timeout (image generation is slow).
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Characters of model text echoed back when no image was returned.
const TEXT_PREVIEW_CHARS: usize = 300;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[cfg(feature = "gemini")]
#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[cfg(feature = "gemini")]
#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    fn text(&self) -> String {
        self.parts()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    /// First inline image as an RGBA PNG, or `NoImageInResponse` carrying a
    /// text preview.
    fn into_image(self, model: &str) -> Result<Artifact> {
        if let Some(inline) = self.parts().find_map(|p| p.inline_data.as_ref()) {
            let url = format!("data:{};base64,{}", inline.mime_type, inline.data);
            return Artifact::from_data_url(&url)?.into_rgba_png();
        }

        let text: String = self.text().chars().take(TEXT_PREVIEW_CHARS).collect();
        Err(StudioError::NoImageInResponse {
            model: model.to_string(),
            text,
        })
    }
}

fn image_body(request: &ImageRequest) -> GenerateContentRequest {
    let mut parts: Vec<Part> = request
        .inputs
        .iter()
        .map(|input| Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: input.mime_type.clone(),
                data: input.to_base64(),
            }),
        })
        .collect();
    parts.push(Part {
        text: Some(request.prompt.clone()),
        inline_data: None,
    });

    GenerateContentRequest {
        contents: vec![Content { parts }],
        generation_config: Some(GenerationConfig {
            response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
            ..Default::default()
        }),
    }
}

fn text_body(request: &TextRequest) -> GenerateContentRequest {
    let config = GenerationConfig {
        response_modalities: None,
        temperature: request.temperature,
        max_output_tokens: request.max_output_tokens,
    };
    let has_config = config.temperature.is_some() || config.max_output_tokens.is_some();

    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: Some(request.prompt.clone()),
                inline_data: None,
            }],
        }],
        generation_config: has_config.then_some(config),
    }
}

/// Gemini REST backend
pub struct GeminiService {
    info: ServiceInfo,
    api_key: String,
    base_url: String,
    timeout_ms: u64,
}

impl GeminiService {
    /// Create a backend from `SCENE_STUDIO_API_URL` / `SCENE_STUDIO_TIMEOUT_MS`.
    pub fn new(api_key: impl Into<String>) -> Self {
        let base_url = env::var("SCENE_STUDIO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let timeout_ms = env::var("SCENE_STUDIO_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        Self::with_config(api_key, base_url, timeout_ms)
    }

    pub fn with_config(api_key: impl Into<String>, base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            info: ServiceInfo::new(
                "gemini",
                "Gemini",
                "v1beta",
                "Google Gemini image and text generation",
                vec!["image", "image_edit", "image_merge", "text"],
            ),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_ms,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    #[cfg(feature = "gemini")]
    fn client(&self) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .build()
            .map_err(|e| StudioError::GenerationUnavailable {
                reason: e.to_string(),
            })
    }

    #[cfg(feature = "gemini")]
    fn map_send_error(&self, model: &str, e: reqwest::Error) -> StudioError {
        if e.is_timeout() {
            StudioError::GenerationFailed {
                model: model.to_string(),
                reason: format!("timed out after {}ms", self.timeout_ms),
            }
        } else if e.is_connect() {
            StudioError::GenerationUnavailable {
                reason: format!("cannot connect to {}: {}", self.base_url, e),
            }
        } else {
            StudioError::GenerationFailed {
                model: model.to_string(),
                reason: e.to_string(),
            }
        }
    }

    #[cfg(feature = "gemini")]
    fn send(&self, model: &str, body: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let response = self
            .client()?
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .map_err(|e| self.map_send_error(model, e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(StudioError::GenerationFailed {
                model: model.to_string(),
                reason: format!("{}: {}", status, detail.chars().take(TEXT_PREVIEW_CHARS).collect::<String>()),
            });
        }

        response.json::<GenerateContentResponse>().map_err(|e| StudioError::GenerationFailed {
            model: model.to_string(),
            reason: format!("invalid response: {}", e),
        })
    }

    #[cfg(not(feature = "gemini"))]
    fn send(&self, model: &str, _body: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        Err(StudioError::GenerationUnavailable {
            reason: format!(
                "cannot call {}: HTTP support not compiled. Build with --features gemini",
                self.endpoint(model)
            ),
        })
    }
}

impl GenerationService for GeminiService {
    fn info(&self) -> &ServiceInfo {
        &self.info
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "gemini") && !self.api_key.is_empty()
    }

    fn generate_image(&self, request: &ImageRequest) -> Result<Artifact> {
        self.validate_image_request(request)?;
        log::debug!(
            "Gemini image request: model={}, inputs={}",
            request.model,
            request.inputs.len()
        );
        self.send(&request.model, &image_body(request))?
            .into_image(&request.model)
    }

    fn generate_text(&self, request: &TextRequest) -> Result<String> {
        let response = self.send(&request.model, &text_body(request))?;
        Ok(response.text().trim().to_string())
    }

    #[cfg(feature = "gemini")]
    fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1beta/models", self.base_url);
        let response = self
            .client()?
            .get(url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .map_err(|e| self.map_send_error("models", e))?;

        let listing: ListModelsResponse =
            response.json().map_err(|e| StudioError::GenerationFailed {
                model: "models".to_string(),
                reason: format!("invalid model listing: {}", e),
            })?;
        Ok(listing.models.into_iter().map(|m| m.name).collect())
    }
}
