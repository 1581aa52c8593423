//! Mock generation backend for testing
//!
//! Produces deterministic fake images and keyword-driven text so the whole
//! studio pipeline can run offline. Any prompt containing "fail" is rejected
//! the way a real backend rejects bad input.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use log::debug;
use sha2::{Digest, Sha256};

use super::artifact::Artifact;
use super::model::{GenerationService, ImageRequest, ServiceInfo, TextRequest};
use super::registry::{IMAGE_MODELS, TEXT_MODELS};
use crate::error::{Result, StudioError};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Mock image/text generator
pub struct MockGenerator {
    info: ServiceInfo,
    image_calls: AtomicUsize,
    text_calls: AtomicUsize,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            info: ServiceInfo::new(
                "mock",
                "Mock Generator",
                "1.0-mock",
                "Deterministic offline image and text generation (MOCK)",
                vec!["image", "image_edit", "image_merge", "text"],
            ),
            image_calls: AtomicUsize::new(0),
            text_calls: AtomicUsize::new(0),
        }
    }

    /// Number of image requests served, including failed ones.
    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    /// Number of text requests served, including failed ones.
    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    fn reject_if_requested(model: &str, prompt: &str) -> Result<()> {
        if prompt.to_lowercase().contains("fail") {
            return Err(StudioError::GenerationFailed {
                model: model.to_string(),
                reason: "mock failure requested by prompt".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationService for MockGenerator {
    fn info(&self) -> &ServiceInfo {
        &self.info
    }

    fn generate_image(&self, request: &ImageRequest) -> Result<Artifact> {
        let start = Instant::now();
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.validate_image_request(request)?;
        Self::reject_if_requested(&request.model, &request.prompt)?;

        let mut hasher = Sha256::new();
        hasher.update(request.model.as_bytes());
        hasher.update(request.prompt.as_bytes());
        for input in &request.inputs {
            hasher.update(&input.data);
        }

        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&hasher.finalize());

        debug!(
            "Mock image for {} ({} inputs) in {}ms",
            request.model,
            request.inputs.len(),
            start.elapsed().as_millis()
        );
        Ok(Artifact::png(data))
    }

    fn generate_text(&self, request: &TextRequest) -> Result<String> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        Self::reject_if_requested(&request.model, &request.prompt)?;

        let prompt = request.prompt.as_str();
        let subject = prompt
            .rsplit_once("PROMPT: ")
            .map(|(_, rest)| rest.trim())
            .unwrap_or(prompt);

        let text = if prompt.contains("Decompose") {
            mock_decomposition(subject)
        } else if prompt.contains("Improve") {
            format!("{}, highly detailed, cinematic composition (MOCK)", subject)
        } else if prompt.contains("Reply with just the word OK") {
            "OK".to_string()
        } else {
            format!("Mock response to: {}", subject)
        };

        Ok(text)
    }

    fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec![
            format!("models/{}", IMAGE_MODELS[0]),
            format!("models/{}", TEXT_MODELS[0]),
        ])
    }
}

/// Split "object, background, light, mood" and answer the way chat models
/// tend to: JSON wrapped in a code fence.
fn mock_decomposition(subject: &str) -> String {
    let mut parts = subject.split(',').map(str::trim);
    let json = serde_json::json!({
        "object": parts.next().unwrap_or_default(),
        "background": parts.next().unwrap_or_default(),
        "light": parts.next().unwrap_or_default(),
        "mood": parts.next().unwrap_or_default(),
    });
    format!("```json\n{}\n```", json)
}
