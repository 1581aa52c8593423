//! Model preference lists and detection
//!
//! Picks the image and text models to use from whatever the backend reports.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::model::GenerationService;

/// Image-capable models, most preferred first.
pub const IMAGE_MODELS: &[&str] = &["gemini-2.5-flash-image", "gemini-2.0-flash-exp"];

/// Text models, most preferred first.
pub const TEXT_MODELS: &[&str] = &["gemini-2.0-flash", "gemini-2.0-flash-lite", "gemini-1.5-flash"];

/// The pair of models a studio session uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub image_model: String,
    pub text_model: String,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            image_model: IMAGE_MODELS[0].to_string(),
            text_model: TEXT_MODELS[0].to_string(),
        }
    }
}

/// Choose the first preferred model present in `available`.
///
/// Names may carry a `models/` prefix. Falls back to the first preference
/// when none of the preferred models is listed.
pub fn detect_models(available: &[String]) -> ModelSelection {
    let names: Vec<&str> = available
        .iter()
        .map(|name| name.rsplit('/').next().unwrap_or(name))
        .collect();

    let pick = |preferred: &[&str]| {
        preferred
            .iter()
            .find(|model| names.contains(model))
            .unwrap_or(&preferred[0])
            .to_string()
    };

    ModelSelection {
        image_model: pick(IMAGE_MODELS),
        text_model: pick(TEXT_MODELS),
    }
}

/// Ask the backend for its models and choose from them.
///
/// Listing failures fall back to the defaults.
pub fn detect_with(service: &dyn GenerationService) -> ModelSelection {
    match service.list_models() {
        Ok(models) => {
            let selection = detect_models(&models);
            debug!(
                "Detected models via {}: image={}, text={}",
                service.id(),
                selection.image_model,
                selection.text_model
            );
            selection
        }
        Err(e) => {
            warn!("Could not list models from {}: {}", service.id(), e);
            ModelSelection::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detect_prefers_first_available() {
        let available = names(&[
            "models/gemini-2.0-flash-exp",
            "models/gemini-2.0-flash-lite",
            "models/gemini-1.5-flash",
        ]);
        let selection = detect_models(&available);
        assert_eq!(selection.image_model, "gemini-2.0-flash-exp");
        assert_eq!(selection.text_model, "gemini-2.0-flash-lite");
    }

    #[test]
    fn test_detect_falls_back_to_defaults() {
        let selection = detect_models(&names(&["models/something-else"]));
        assert_eq!(selection, ModelSelection::default());

        let selection = detect_models(&[]);
        assert_eq!(selection.image_model, "gemini-2.5-flash-image");
        assert_eq!(selection.text_model, "gemini-2.0-flash");
    }
}
