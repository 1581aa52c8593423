//! JSON snapshots of a layer history store.
//!
//! A scene is saved as a single pretty-printed JSON document. Loading checks
//! every history invariant before handing back a store.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::layer::LayerHistory;
use super::store::LayerHistoryStore;
use super::version::{LayerId, Version};
use crate::error::{Result, StudioError};

/// Current snapshot schema version.
pub const SCHEMA_VERSION: &str = "1";

/// Largest `next_sequence` a snapshot may carry. Leaves room for every
/// later push without the counter wrapping.
pub const MAX_NEXT_SEQUENCE: u64 = i64::MAX as u64;

/// Persisted history of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    /// Retained versions, oldest first.
    pub versions: Vec<Version>,

    /// Index of the current version; `None` when `versions` is empty.
    pub cursor: Option<usize>,
}

/// Persisted state of a whole scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub schema_version: String,
    pub saved_at: DateTime<Utc>,
    pub capacity: usize,
    pub next_sequence: u64,
    pub layers: BTreeMap<LayerId, LayerSnapshot>,
}

impl LayerHistoryStore {
    /// Capture the current state of every layer.
    pub fn snapshot(&self) -> SceneSnapshot {
        let layers = self
            .export_layers()
            .into_iter()
            .map(|(id, history)| {
                let snapshot = LayerSnapshot {
                    versions: history.versions().cloned().collect(),
                    cursor: history.cursor(),
                };
                (id, snapshot)
            })
            .collect();

        SceneSnapshot {
            schema_version: SCHEMA_VERSION.to_string(),
            saved_at: Utc::now(),
            capacity: self.capacity(),
            next_sequence: self.next_sequence(),
            layers,
        }
    }

    /// Rebuild a store from a snapshot, validating every layer.
    pub fn from_snapshot(snapshot: SceneSnapshot) -> Result<Self> {
        if snapshot.schema_version != SCHEMA_VERSION {
            return Err(StudioError::InvalidSnapshot {
                reason: format!(
                    "unsupported schema version {} (expected {})",
                    snapshot.schema_version, SCHEMA_VERSION
                ),
            });
        }

        if snapshot.next_sequence == 0 || snapshot.next_sequence > MAX_NEXT_SEQUENCE {
            return Err(StudioError::InvalidSnapshot {
                reason: format!(
                    "next_sequence {} outside 1..={}",
                    snapshot.next_sequence, MAX_NEXT_SEQUENCE
                ),
            });
        }

        let mut layers = HashMap::with_capacity(snapshot.layers.len());
        for (id, layer) in snapshot.layers {
            if let Some(last) = layer.versions.last() {
                if last.sequence >= snapshot.next_sequence {
                    return Err(StudioError::InvalidSnapshot {
                        reason: format!(
                            "layer '{}': sequence {} not below next_sequence {}",
                            id, last.sequence, snapshot.next_sequence
                        ),
                    });
                }
            }
            let history = LayerHistory::from_parts(layer.versions, layer.cursor, snapshot.capacity)
                .map_err(|reason| StudioError::InvalidSnapshot {
                    reason: format!("layer '{}': {}", id, reason),
                })?;
            layers.insert(id, history);
        }

        Ok(Self::from_parts(
            layers,
            snapshot.capacity,
            snapshot.next_sequence,
        ))
    }

    /// Write the store to `path` as JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StudioError::FileWriteError {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let content = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(path, content).map_err(|e| StudioError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!("Saved scene to {}", path.display());
        Ok(())
    }

    /// Load a store previously written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| StudioError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let snapshot: SceneSnapshot = serde_json::from_str(&content)?;
        let store = Self::from_snapshot(snapshot)?;

        info!("Loaded scene from {}", path.display());
        Ok(store)
    }

    /// Load from `path`, or start an empty store with `capacity` if the file
    /// does not exist yet.
    pub fn load_or_default(path: &Path, capacity: usize) -> Result<Self> {
        if path.exists() {
            let mut store = Self::load(path)?;
            if store.capacity() != capacity {
                store.set_capacity(capacity);
            }
            Ok(store)
        } else {
            debug!("No scene at {}, starting empty", path.display());
            Ok(Self::with_capacity(capacity))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_preserves_cursor() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scene.json");

        let store = LayerHistoryStore::new();
        store.push("object", "o1");
        store.push("object", "o2");
        store.push("object", "o3");
        store.undo("object").unwrap();
        store.push("background", "b1");
        store.save(&path).unwrap();

        let loaded = LayerHistoryStore::load(&path).unwrap();
        assert_eq!(loaded.cursor("object"), Some(1));
        assert_eq!(loaded.current("object").unwrap().content_ref.as_str(), "o2");
        assert_eq!(loaded.redo("object").unwrap().content_ref.as_str(), "o3");
        assert_eq!(loaded.history("background").len(), 1);
    }

    #[test]
    fn test_loaded_store_continues_sequence() {
        let store = LayerHistoryStore::new();
        let first = store.push("object", "o1");

        let loaded = LayerHistoryStore::from_snapshot(store.snapshot()).unwrap();
        let next = loaded.push("object", "o2");
        assert!(next.sequence > first.sequence);
    }

    #[test]
    fn test_rejects_unknown_schema() {
        let mut snapshot = LayerHistoryStore::new().snapshot();
        snapshot.schema_version = "99".to_string();

        let err = LayerHistoryStore::from_snapshot(snapshot).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SNAPSHOT");
    }

    #[test]
    fn test_rejects_cursor_out_of_bounds() {
        let store = LayerHistoryStore::new();
        store.push("object", "o1");
        let mut snapshot = store.snapshot();
        if let Some(layer) = snapshot.layers.get_mut("object") {
            layer.cursor = Some(5);
        }

        assert!(LayerHistoryStore::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn test_rejects_stale_next_sequence() {
        let store = LayerHistoryStore::new();
        store.push("object", "o1");
        let mut snapshot = store.snapshot();
        snapshot.next_sequence = 1;

        assert!(LayerHistoryStore::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn test_rejects_next_sequence_that_would_wrap() {
        let mut snapshot = LayerHistoryStore::new().snapshot();
        snapshot.next_sequence = u64::MAX;

        let err = LayerHistoryStore::from_snapshot(snapshot).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SNAPSHOT");
    }

    #[test]
    fn test_pushes_past_sequence_limit_do_not_wrap() {
        let mut snapshot = LayerHistoryStore::new().snapshot();
        snapshot.next_sequence = MAX_NEXT_SEQUENCE;
        let store = LayerHistoryStore::from_snapshot(snapshot).unwrap();

        let a = store.push("object", "o1");
        let b = store.push("object", "o2");
        assert_eq!(a.sequence, MAX_NEXT_SEQUENCE);
        assert_eq!(b.sequence, MAX_NEXT_SEQUENCE + 1);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");

        let store = LayerHistoryStore::load_or_default(&path, 5).unwrap();
        assert_eq!(store.capacity(), 5);
        assert!(store.layer_ids().is_empty());
    }

    #[test]
    fn test_load_or_default_applies_new_capacity() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("scene.json");

        let store = LayerHistoryStore::new();
        for i in 0..10 {
            store.push("object", format!("o{}", i));
        }
        store.save(&path).unwrap();

        let loaded = LayerHistoryStore::load_or_default(&path, 4).unwrap();
        assert_eq!(loaded.history("object").len(), 4);
        assert_eq!(loaded.current("object").unwrap().content_ref.as_str(), "o9");
    }

    #[test]
    fn test_load_garbage_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scene.json");
        fs::write(&path, "not json").unwrap();

        let err = LayerHistoryStore::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
