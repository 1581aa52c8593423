//! Scene Studio - AI Layer Compositor
//!
//! Scene Studio builds an image scene out of independently generated layers
//! (object, background, light, combo and custom) and keeps a bounded,
//! per-layer version history with undo and redo.
//!
//! # Architecture
//!
//! - `history`: the layer history store. Each layer holds at most
//!   [`history::MAX_HISTORY`] versions and a cursor to its current one.
//! - `generation`: the image/text backend seam, with a deterministic mock
//!   and a Gemini REST client behind the `gemini` feature.
//! - `scene`: prompt templates and the [`Studio`] session tying both together.

pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod history;
pub mod scene;

pub use config::StudioConfig;
pub use error::{Result, StudioError};
pub use generation::{Artifact, GenerationService, MockGenerator, ModelSelection};
pub use history::{
    ContentRef, LayerHistoryStore, LayerId, NotFound, NotFoundReason, Version, MAX_HISTORY,
};
pub use scene::{LayerKind, ScenePrompts, Studio};
