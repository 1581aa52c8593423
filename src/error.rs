//! Error handling for Scene Studio
//!
//! History lookups fail with [`NotFound`] only. Everything around the store
//! (generation, persistence, config) reports through [`StudioError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::history::NotFound;

/// Result type alias for Scene Studio operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Main error type for Scene Studio operations
#[derive(Error, Debug)]
pub enum StudioError {
    // History Errors
    #[error(transparent)]
    NotFound(#[from] NotFound),

    // Generation Errors
    #[error("Generation failed with model {model}: {reason}")]
    GenerationFailed { model: String, reason: String },

    #[error("Generation service unavailable: {reason}")]
    GenerationUnavailable { reason: String },

    #[error("No image in response from [{model}]. Got: {text}")]
    NoImageInResponse { model: String, text: String },

    #[error("Invalid artifact: {reason}")]
    InvalidArtifact { reason: String },

    // Input Errors
    #[error("Unknown layer kind: {kind}")]
    UnknownLayerKind { kind: String },

    #[error("Invalid parameter {param}={value}: expected {expected}")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    // Persistence Errors
    #[error("Invalid scene snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StudioError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            StudioError::NotFound(_) => "NOT_FOUND",
            StudioError::GenerationFailed { .. } => "GENERATION_FAILED",
            StudioError::GenerationUnavailable { .. } => "GENERATION_UNAVAILABLE",
            StudioError::NoImageInResponse { .. } => "NO_IMAGE_IN_RESPONSE",
            StudioError::InvalidArtifact { .. } => "INVALID_ARTIFACT",
            StudioError::UnknownLayerKind { .. } => "UNKNOWN_LAYER_KIND",
            StudioError::InvalidParameter { .. } => "INVALID_PARAMETER",
            StudioError::InvalidSnapshot { .. } => "INVALID_SNAPSHOT",
            StudioError::FileReadError { .. } => "FILE_READ_ERROR",
            StudioError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            StudioError::Config { .. } => "CONFIG_ERROR",
            StudioError::Io(_) => "IO_ERROR",
            StudioError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable by the caller
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StudioError::NotFound(_)
                | StudioError::GenerationFailed { .. }
                | StudioError::NoImageInResponse { .. }
                | StudioError::UnknownLayerKind { .. }
                | StudioError::InvalidParameter { .. }
        )
    }

    /// Returns a user-facing recovery suggestion, if one applies.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StudioError::NotFound(_) => Some("Generate a version for this layer first."),
            StudioError::GenerationFailed { .. } => {
                Some("Try again, or rephrase the prompt.")
            }
            StudioError::GenerationUnavailable { .. } => Some(
                "Set SCENE_STUDIO_API_KEY and build with --features gemini, or use --mock.",
            ),
            StudioError::NoImageInResponse { .. } => {
                Some("The model answered with text only. Try an image-capable model.")
            }
            StudioError::UnknownLayerKind { .. } => {
                Some("Valid kinds: object, background, light, combo, custom.")
            }
            StudioError::InvalidSnapshot { .. } => {
                Some("The session file is damaged. Start a new session.")
            }
            _ => None,
        }
    }
}
