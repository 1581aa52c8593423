//! Scene-scoped store of layer histories.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use log::debug;

use super::layer::LayerHistory;
use super::version::{ContentRef, LayerId, Version};
use super::{NotFound, NotFoundReason, MAX_HISTORY};

type SharedLayer = Arc<Mutex<LayerHistory>>;

/// Owns the version history of every layer in one scene.
///
/// Mutations are serialized per layer: each layer sits behind its own mutex,
/// and the layer map is write-locked only to add or drop layers. Operations on
/// different layers never contend on the same lock.
#[derive(Debug)]
pub struct LayerHistoryStore {
    layers: RwLock<HashMap<LayerId, SharedLayer>>,
    capacity: usize,
    next_sequence: AtomicU64,
}

impl Default for LayerHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerHistoryStore {
    /// Create a store retaining `MAX_HISTORY` versions per layer.
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    /// Create a store with a custom per-layer bound (at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            layers: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            next_sequence: AtomicU64::new(1),
        }
    }

    pub(crate) fn from_parts(
        layers: HashMap<LayerId, LayerHistory>,
        capacity: usize,
        next_sequence: u64,
    ) -> Self {
        let layers = layers
            .into_iter()
            .map(|(id, history)| (id, Arc::new(Mutex::new(history))))
            .collect();
        Self {
            layers: RwLock::new(layers),
            capacity: capacity.max(1),
            next_sequence: AtomicU64::new(next_sequence),
        }
    }

    /// Append a new version to a layer, creating the layer if needed.
    pub fn push(&self, layer_id: impl Into<LayerId>, content_ref: impl Into<ContentRef>) -> Version {
        self.push_labeled(layer_id, content_ref, None)
    }

    /// Same as [`push`](Self::push), attaching a description to the version.
    pub fn push_labeled(
        &self,
        layer_id: impl Into<LayerId>,
        content_ref: impl Into<ContentRef>,
        label: Option<String>,
    ) -> Version {
        let layer_id = layer_id.into();

        // The map read lock is held until the push lands, so `remove_layer`
        // cannot orphan the layer mid-push.
        let layers = loop {
            self.ensure_layer(&layer_id);
            let layers = self.layers.read().unwrap_or_else(PoisonError::into_inner);
            if layers.contains_key(&layer_id) {
                break layers;
            }
        };
        let mut history = lock(&layers[&layer_id]);

        // Sequence is taken under the layer lock so it grows within each layer.
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let version = Version::new(sequence, content_ref.into(), label);
        let evicted = history.push(version.clone());

        debug!(
            "Pushed version #{} to layer '{}' ({} retained)",
            sequence,
            layer_id,
            history.len()
        );
        for old in evicted {
            debug!("Evicted version #{} from layer '{}'", old.sequence, layer_id);
        }

        version
    }

    /// The current (most recently pushed, non-undone) version of a layer.
    pub fn current(&self, layer_id: &str) -> Result<Version, NotFound> {
        self.with_layer(layer_id, |history| history.current().cloned())
    }

    /// Step one version back and return the version now current.
    pub fn undo(&self, layer_id: &str) -> Result<Version, NotFound> {
        let version = self.with_layer(layer_id, |history| history.undo().cloned())?;
        debug!("Undo on layer '{}' -> version #{}", layer_id, version.sequence);
        Ok(version)
    }

    /// Step one version forward and return the version now current.
    pub fn redo(&self, layer_id: &str) -> Result<Version, NotFound> {
        let version = self.with_layer(layer_id, |history| history.redo().cloned())?;
        debug!("Redo on layer '{}' -> version #{}", layer_id, version.sequence);
        Ok(version)
    }

    /// Retained versions of a layer, oldest first. Empty for unknown layers.
    pub fn history(&self, layer_id: &str) -> Vec<Version> {
        self.layer(layer_id)
            .map(|layer| lock(&layer).versions().cloned().collect())
            .unwrap_or_default()
    }

    /// Cursor position of a layer, `None` if the layer has no versions.
    pub fn cursor(&self, layer_id: &str) -> Option<usize> {
        self.layer(layer_id).and_then(|layer| lock(&layer).cursor())
    }

    pub fn can_undo(&self, layer_id: &str) -> bool {
        self.layer(layer_id)
            .map(|layer| lock(&layer).can_undo())
            .unwrap_or(false)
    }

    pub fn can_redo(&self, layer_id: &str) -> bool {
        self.layer(layer_id)
            .map(|layer| lock(&layer).can_redo())
            .unwrap_or(false)
    }

    /// All known layer ids, sorted.
    pub fn layer_ids(&self) -> Vec<LayerId> {
        let layers = self.layers.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<LayerId> = layers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, layer_id: &str) -> bool {
        self.layers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(layer_id)
    }

    /// Drop a layer and its history. Returns whether it existed.
    pub fn remove_layer(&self, layer_id: &str) -> bool {
        let removed = self
            .layers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(layer_id)
            .is_some();
        if removed {
            debug!("Removed layer '{}'", layer_id);
        }
        removed
    }

    /// Drop every layer.
    pub fn clear(&self) {
        self.layers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the per-layer bound, evicting the oldest versions where needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        let layers = self.layers.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (id, layer) in layers.iter() {
            let evicted = lock(layer).set_capacity(self.capacity);
            if !evicted.is_empty() {
                debug!("Evicted {} versions from layer '{}'", evicted.len(), id);
            }
        }
    }

    pub(crate) fn next_sequence(&self) -> u64 {
        self.next_sequence.load(Ordering::SeqCst)
    }

    /// Copy out every layer's history under its lock.
    pub(crate) fn export_layers(&self) -> Vec<(LayerId, LayerHistory)> {
        let layers = self.layers.read().unwrap_or_else(PoisonError::into_inner);
        layers
            .iter()
            .map(|(id, layer)| (id.clone(), lock(layer).clone()))
            .collect()
    }

    fn layer(&self, layer_id: &str) -> Option<SharedLayer> {
        self.layers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(layer_id)
            .cloned()
    }

    fn ensure_layer(&self, layer_id: &LayerId) {
        if self.contains(layer_id.as_str()) {
            return;
        }
        let mut layers = self.layers.write().unwrap_or_else(PoisonError::into_inner);
        layers.entry(layer_id.clone()).or_insert_with(|| {
            debug!("Created layer '{}'", layer_id);
            Arc::new(Mutex::new(LayerHistory::new(self.capacity)))
        });
    }

    fn with_layer<F>(&self, layer_id: &str, op: F) -> Result<Version, NotFound>
    where
        F: FnOnce(&mut LayerHistory) -> Result<Version, NotFoundReason>,
    {
        let not_found = |reason| NotFound::new(LayerId::from(layer_id), reason);
        let layer = self
            .layer(layer_id)
            .ok_or_else(|| not_found(NotFoundReason::Empty))?;
        let mut history = lock(&layer);
        op(&mut history).map_err(not_found)
    }
}

// A panic while holding a layer lock cannot leave the history half-updated:
// every mutation completes before any code that could panic runs.
fn lock(layer: &SharedLayer) -> MutexGuard<'_, LayerHistory> {
    layer.lock().unwrap_or_else(PoisonError::into_inner)
}
