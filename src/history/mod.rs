//! Layer History
//!
//! Per-layer bounded version history with undo/redo:
//! - `Version` snapshots keyed by `LayerId`
//! - `LayerHistory` window of the last `MAX_HISTORY` versions plus a cursor
//! - `LayerHistoryStore` owning every layer of one scene, locked per layer
//! - JSON snapshots for persisting a scene between sessions

mod layer;
mod persistence;
mod store;
mod version;

use std::fmt;

use thiserror::Error;

pub use layer::LayerHistory;
pub use persistence::{LayerSnapshot, SceneSnapshot, MAX_NEXT_SEQUENCE, SCHEMA_VERSION};
pub use store::LayerHistoryStore;
pub use version::{ContentRef, LayerId, Version};

/// Maximum number of versions retained per layer.
pub const MAX_HISTORY: usize = 12;

/// Why a history lookup found no applicable version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The layer has no versions (never pushed, or unknown).
    Empty,
    /// Undo requested while already at the oldest retained version.
    AtOldest,
    /// Redo requested while already at the newest version.
    AtNewest,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::Empty => write!(f, "no versions yet"),
            NotFoundReason::AtOldest => write!(f, "nothing to undo"),
            NotFoundReason::AtNewest => write!(f, "nothing to redo"),
        }
    }
}

/// The only error the history store produces.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Layer '{layer_id}': {reason}")]
pub struct NotFound {
    pub layer_id: LayerId,
    pub reason: NotFoundReason,
}

impl NotFound {
    pub fn new(layer_id: LayerId, reason: NotFoundReason) -> Self {
        Self { layer_id, reason }
    }
}
