//! Generation service interfaces and implementations
//!
//! This module provides:
//! - `GenerationService` trait for image/text backends
//! - `Artifact` bytes with `data:` URL encoding
//! - Model preference lists and detection
//! - A Gemini REST backend (transport behind the `gemini` feature)
//! - A deterministic mock for offline use and testing

mod artifact;
mod gemini;
mod mock;
mod model;
mod registry;

pub use artifact::{Artifact, DEFAULT_MIME_TYPE};
pub use gemini::{GeminiService, DEFAULT_API_URL, DEFAULT_TIMEOUT_MS};
pub use mock::MockGenerator;
pub use model::{GenerationService, ImageRequest, ServiceInfo, TextRequest};
pub use registry::{detect_models, detect_with, ModelSelection, IMAGE_MODELS, TEXT_MODELS};
