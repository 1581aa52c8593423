//! Generation service trait and request types
//!
//! Defines the interface every image/text generation backend implements.

use serde::{Deserialize, Serialize};

use super::artifact::Artifact;
use crate::error::{Result, StudioError};

/// Information about a generation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Backend identifier (e.g., "mock", "gemini")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Backend version
    pub version: String,

    /// Description of the backend
    pub description: String,

    /// Capabilities list
    pub capabilities: Vec<String>,
}

impl ServiceInfo {
    pub fn new(id: &str, name: &str, version: &str, description: &str, capabilities: Vec<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            description: description.to_string(),
            capabilities: capabilities.into_iter().map(String::from).collect(),
        }
    }
}

/// Request for an image, optionally conditioned on input images.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    /// Input images, in the order the prompt refers to them.
    pub inputs: Vec<Artifact>,
}

impl ImageRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            inputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, artifact: Artifact) -> Self {
        self.inputs.push(artifact);
        self
    }
}

/// Request for a text completion.
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl TextRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: None,
            max_output_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }
}

/// Trait that all generation backends must implement
pub trait GenerationService: Send + Sync {
    /// Get backend information
    fn info(&self) -> &ServiceInfo;

    /// Produce an image for the request
    fn generate_image(&self, request: &ImageRequest) -> Result<Artifact>;

    /// Produce text for the request
    fn generate_text(&self, request: &TextRequest) -> Result<String>;

    /// Names of the models this backend can serve. Empty when unknown.
    fn list_models(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Check if the backend is ready to use
    fn is_available(&self) -> bool {
        true
    }

    /// Get backend ID (convenience method)
    fn id(&self) -> &str {
        &self.info().id
    }

    /// Validate an image request before sending it
    fn validate_image_request(&self, request: &ImageRequest) -> Result<()> {
        if request.prompt.trim().is_empty() {
            return Err(StudioError::InvalidParameter {
                param: "prompt".to_string(),
                value: "<empty>".to_string(),
                expected: "a non-empty description".to_string(),
            });
        }
        if request.model.trim().is_empty() {
            return Err(StudioError::InvalidParameter {
                param: "model".to_string(),
                value: "<empty>".to_string(),
                expected: "an image model name".to_string(),
            });
        }
        Ok(())
    }
}

impl<S: GenerationService + ?Sized> GenerationService for Box<S> {
    fn info(&self) -> &ServiceInfo {
        (**self).info()
    }

    fn generate_image(&self, request: &ImageRequest) -> Result<Artifact> {
        (**self).generate_image(request)
    }

    fn generate_text(&self, request: &TextRequest) -> Result<String> {
        (**self).generate_text(request)
    }

    fn list_models(&self) -> Result<Vec<String>> {
        (**self).list_models()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn validate_image_request(&self, request: &ImageRequest) -> Result<()> {
        (**self).validate_image_request(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_request_builder() {
        let request = ImageRequest::new("img-model", "a red apple")
            .with_input(Artifact::png(vec![1]))
            .with_input(Artifact::png(vec![2]));

        assert_eq!(request.inputs.len(), 2);
        assert_eq!(request.inputs[0].data, vec![1]);
    }

    #[test]
    fn test_text_request_builder() {
        let request = TextRequest::new("txt-model", "hello")
            .with_temperature(0.2)
            .with_max_output_tokens(5);

        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_output_tokens, Some(5));
    }
}
