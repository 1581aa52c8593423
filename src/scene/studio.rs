//! Studio session
//!
//! Binds one scene's layer history to a generation backend. Every operation
//! that talks to the backend finishes generating before it touches the store,
//! so a failed generation never records a version.

use log::{info, warn};
use serde::Serialize;

use super::kind::LayerKind;
use super::prompt::{
    decompose_prompt, edit_prompt, improve_prompt, layer_prompt, merge_prompt,
    parse_decomposition, Decomposition, ScenePrompts,
};
use crate::error::{Result, StudioError};
use crate::generation::{
    detect_with, Artifact, GenerationService, ImageRequest, ModelSelection, TextRequest,
};
use crate::history::{LayerHistoryStore, LayerId, Version};

/// Temperature for decomposition requests.
const DECOMPOSE_TEMPERATURE: f32 = 0.2;

/// Temperature for prompt improvement requests.
const IMPROVE_TEMPERATURE: f32 = 0.35;

/// Result of generating every layer of a scene.
#[derive(Debug, Clone, Serialize)]
pub struct SceneGeneration {
    /// Sub-prompts actually used (decomposed or user-supplied).
    pub decomposition: Decomposition,

    /// Recorded versions, in generation order.
    pub versions: Vec<(LayerKind, Version)>,
}

/// A scene session: layer history plus the backend that fills it.
pub struct Studio<S> {
    store: LayerHistoryStore,
    service: S,
    models: ModelSelection,
}

impl<S: GenerationService> Studio<S> {
    /// Start an empty scene with default models.
    pub fn new(service: S) -> Self {
        Self::with_store(service, LayerHistoryStore::new(), ModelSelection::default())
    }

    /// Resume a scene from an existing store.
    pub fn with_store(service: S, store: LayerHistoryStore, models: ModelSelection) -> Self {
        Self {
            store,
            service,
            models,
        }
    }

    pub fn store(&self) -> &LayerHistoryStore {
        &self.store
    }

    pub fn into_store(self) -> LayerHistoryStore {
        self.store
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn models(&self) -> &ModelSelection {
        &self.models
    }

    /// Pick models from what the backend offers and check it answers.
    pub fn connect(&mut self) -> Result<ModelSelection> {
        if !self.service.is_available() {
            return Err(StudioError::GenerationUnavailable {
                reason: format!("backend '{}' is not available", self.service.id()),
            });
        }

        let models = detect_with(&self.service);
        let probe = TextRequest::new(&models.text_model, "Reply with just the word OK.")
            .with_max_output_tokens(5);
        self.service.generate_text(&probe)?;

        info!(
            "Connected to {}: image={}, text={}",
            self.service.id(),
            models.image_model,
            models.text_model
        );
        self.models = models.clone();
        Ok(models)
    }

    /// Generate one layer and record it under the kind's layer id.
    pub fn generate_layer(&self, kind: LayerKind, prompts: &ScenePrompts) -> Result<Version> {
        let artifact = self.render_layer(kind, prompts)?;
        Ok(self.record(kind.layer_id(), &artifact, layer_label(kind, prompts)))
    }

    /// Generate object, background, light and combo layers.
    ///
    /// Sub-prompts are decomposed from the main prompt when neither object nor
    /// background was given. Nothing is recorded unless all four succeed.
    pub fn generate_all(&self, prompts: &ScenePrompts) -> Result<SceneGeneration> {
        let prompts = if prompts.needs_decomposition() {
            let decomposition = self.decompose(&prompts.main)?;
            prompts.with_decomposition(&decomposition)
        } else {
            prompts.clone()
        };

        let artifacts = LayerKind::SCENE
            .iter()
            .map(|&kind| self.render_layer(kind, &prompts).map(|a| (kind, a)))
            .collect::<Result<Vec<_>>>()?;

        let versions = artifacts
            .into_iter()
            .map(|(kind, artifact)| {
                let version = self.record(kind.layer_id(), &artifact, layer_label(kind, &prompts));
                (kind, version)
            })
            .collect();

        Ok(SceneGeneration {
            decomposition: prompts.decomposition(),
            versions,
        })
    }

    /// Apply an edit instruction to a layer's current image.
    pub fn edit(&self, layer_id: &str, instruction: &str) -> Result<Version> {
        let source = self.current_artifact(layer_id)?;
        let request = ImageRequest::new(&self.models.image_model, edit_prompt(instruction))
            .with_input(source);
        let artifact = self.service.generate_image(&request)?;

        Ok(self.record(
            LayerId::from(layer_id),
            &artifact,
            Some(format!("edit: {}", instruction)),
        ))
    }

    /// Composite `fg` over `bg` and record the result on `target`.
    pub fn merge(&self, fg: &str, bg: &str, hint: &str, target: &str) -> Result<Version> {
        let foreground = self.current_artifact(fg)?;
        let background = self.current_artifact(bg)?;
        let request = ImageRequest::new(&self.models.image_model, merge_prompt(fg, bg, hint))
            .with_input(foreground)
            .with_input(background);
        let artifact = self.service.generate_image(&request)?;

        Ok(self.record(
            LayerId::from(target),
            &artifact,
            Some(format!("merge: {} over {}", fg, bg)),
        ))
    }

    /// Split a scene prompt into per-layer descriptions.
    pub fn decompose(&self, main: &str) -> Result<Decomposition> {
        let request = TextRequest::new(&self.models.text_model, decompose_prompt(main))
            .with_temperature(DECOMPOSE_TEMPERATURE);
        let text = self.service.generate_text(&request)?;

        let decomposition = parse_decomposition(&text);
        if decomposition == Decomposition::default() {
            warn!("Decomposition came back empty; layers will infer from the scene");
        }
        Ok(decomposition)
    }

    /// Rewrite a prompt so it is more specific for `target`.
    pub fn improve(&self, text: &str, target: &str) -> Result<String> {
        let request = TextRequest::new(&self.models.text_model, improve_prompt(text, target))
            .with_temperature(IMPROVE_TEMPERATURE);
        Ok(self.service.generate_text(&request)?.trim().to_string())
    }

    pub fn current(&self, layer_id: &str) -> Result<Version> {
        Ok(self.store.current(layer_id)?)
    }

    pub fn undo(&self, layer_id: &str) -> Result<Version> {
        Ok(self.store.undo(layer_id)?)
    }

    pub fn redo(&self, layer_id: &str) -> Result<Version> {
        Ok(self.store.redo(layer_id)?)
    }

    pub fn history(&self, layer_id: &str) -> Vec<Version> {
        self.store.history(layer_id)
    }

    fn render_layer(&self, kind: LayerKind, prompts: &ScenePrompts) -> Result<Artifact> {
        let request = ImageRequest::new(&self.models.image_model, layer_prompt(kind, prompts));
        self.service.generate_image(&request)
    }

    fn current_artifact(&self, layer_id: &str) -> Result<Artifact> {
        let version = self.store.current(layer_id)?;
        Artifact::from_content_ref(&version.content_ref)
    }

    fn record(&self, layer_id: LayerId, artifact: &Artifact, label: Option<String>) -> Version {
        let version = self
            .store
            .push_labeled(layer_id.clone(), artifact.to_content_ref(), label);
        info!(
            "Layer '{}' now at version #{} ({} bytes, sha256 {})",
            layer_id,
            version.sequence,
            artifact.data.len(),
            &artifact.digest()[..12]
        );
        version
    }
}

fn layer_label(kind: LayerKind, prompts: &ScenePrompts) -> Option<String> {
    let text = match kind {
        LayerKind::Custom if !prompts.custom.trim().is_empty() => &prompts.custom,
        _ => &prompts.main,
    };
    Some(format!("{}: {}", kind, text))
}
