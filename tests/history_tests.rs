//! Layer History Tests
//!
//! Behavior of the per-layer version history: bounds, cursor movement,
//! eviction, isolation between layers and concurrent use.

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use scene_studio::history::{LayerHistoryStore, NotFound, NotFoundReason, MAX_HISTORY};

fn refs(store: &LayerHistoryStore, layer: &str) -> Vec<String> {
    store
        .history(layer)
        .into_iter()
        .map(|v| v.content_ref.into_inner())
        .collect()
}

fn push_many(store: &LayerHistoryStore, layer: &str, count: usize) {
    for i in 1..=count {
        store.push(layer, format!("v{}", i));
    }
}

// === Bound Tests ===

#[test]
fn test_history_never_exceeds_max() {
    let store = LayerHistoryStore::new();
    for i in 1..=30 {
        store.push("object", format!("v{}", i));
        assert!(store.history("object").len() <= MAX_HISTORY);
    }
    assert_eq!(store.history("object").len(), 12);
}

#[test]
fn test_thirteenth_push_evicts_oldest() {
    let store = LayerHistoryStore::new();
    push_many(&store, "object", 13);

    let history = refs(&store, "object");
    assert_eq!(history.len(), 12);
    assert_eq!(history.first().map(String::as_str), Some("v2"));
    assert_eq!(store.current("object").unwrap().content_ref.as_str(), "v13");
    assert_eq!(store.cursor("object"), Some(11));
}

// === Cursor Tests ===

#[test]
fn test_undo_redo_walk() {
    let store = LayerHistoryStore::new();
    push_many(&store, "object", 3);

    assert_eq!(store.undo("object").unwrap().content_ref.as_str(), "v2");
    assert_eq!(store.undo("object").unwrap().content_ref.as_str(), "v1");
    assert_eq!(
        store.undo("object").unwrap_err(),
        NotFound::new("object".into(), NotFoundReason::AtOldest)
    );
    assert_eq!(store.redo("object").unwrap().content_ref.as_str(), "v2");
    assert_eq!(store.redo("object").unwrap().content_ref.as_str(), "v3");
    assert_eq!(
        store.redo("object").unwrap_err().reason,
        NotFoundReason::AtNewest
    );
}

#[test]
fn test_push_after_undo_discards_redo() {
    let store = LayerHistoryStore::new();
    push_many(&store, "object", 3);
    store.undo("object").unwrap();

    store.push("object", "v4");

    assert_eq!(refs(&store, "object"), vec!["v1", "v2", "v4"]);
    assert!(!store.can_redo("object"));
    assert_eq!(store.redo("object").unwrap_err().reason, NotFoundReason::AtNewest);
}

#[test]
fn test_failed_undo_leaves_state_unchanged() {
    let store = LayerHistoryStore::new();
    store.push("object", "v1");

    assert!(store.undo("object").is_err());
    assert_eq!(refs(&store, "object"), vec!["v1"]);
    assert_eq!(store.cursor("object"), Some(0));
}

#[test]
fn test_push_at_oldest_of_full_history() {
    let store = LayerHistoryStore::new();
    push_many(&store, "object", 12);
    for _ in 0..11 {
        store.undo("object").unwrap();
    }
    assert_eq!(store.cursor("object"), Some(0));

    store.push("object", "v13");

    // Redo entries are discarded before the bound is checked, so nothing is evicted.
    assert_eq!(refs(&store, "object"), vec!["v1", "v13"]);
    assert_eq!(store.cursor("object"), Some(1));
}

#[test]
fn test_shrinking_capacity_with_cursor_at_oldest() {
    let mut store = LayerHistoryStore::new();
    push_many(&store, "object", 12);
    for _ in 0..11 {
        store.undo("object").unwrap();
    }

    store.set_capacity(4);

    assert_eq!(refs(&store, "object"), vec!["v9", "v10", "v11", "v12"]);
    assert_eq!(store.cursor("object"), Some(0));
    assert_eq!(store.current("object").unwrap().content_ref.as_str(), "v9");
}

#[test]
fn test_shrinking_capacity_keeps_relative_cursor() {
    let mut store = LayerHistoryStore::new();
    push_many(&store, "object", 10);
    store.undo("object").unwrap();

    store.set_capacity(5);

    assert_eq!(refs(&store, "object"), vec!["v6", "v7", "v8", "v9", "v10"]);
    assert_eq!(store.current("object").unwrap().content_ref.as_str(), "v9");
}

// === Empty Layer Tests ===

#[test]
fn test_empty_layer_queries() {
    let store = LayerHistoryStore::new();

    for result in [store.current("ghost"), store.undo("ghost"), store.redo("ghost")] {
        assert_eq!(result.unwrap_err().reason, NotFoundReason::Empty);
    }
    assert!(store.history("ghost").is_empty());
    assert_eq!(store.cursor("ghost"), None);
    assert!(!store.contains("ghost"));
}

// === Isolation Tests ===

#[test]
fn test_layers_are_independent() {
    let store = LayerHistoryStore::new();
    push_many(&store, "object", 3);
    push_many(&store, "background", 2);

    store.undo("object").unwrap();
    store.undo("object").unwrap();

    assert_eq!(store.current("background").unwrap().content_ref.as_str(), "v2");
    assert_eq!(refs(&store, "background"), vec!["v1", "v2"]);
    assert_eq!(store.cursor("object"), Some(0));
}

#[test]
fn test_sequence_is_strictly_increasing() {
    let store = LayerHistoryStore::new();
    let a = store.push("object", "a");
    let b = store.push("light", "b");
    let c = store.push("object", "c");

    assert!(a.sequence < b.sequence);
    assert!(b.sequence < c.sequence);
}

#[test]
fn test_remove_layer_and_clear() {
    let store = LayerHistoryStore::new();
    store.push("object", "a");
    store.push("light", "b");

    assert!(store.remove_layer("object"));
    assert!(!store.remove_layer("object"));
    assert_eq!(store.layer_ids().len(), 1);

    store.clear();
    assert!(store.layer_ids().is_empty());
}

// === Concurrency Tests ===

#[test]
fn test_concurrent_pushes_respect_bound() {
    let store = LayerHistoryStore::new();

    std::thread::scope(|scope| {
        for t in 0..8 {
            let store = &store;
            scope.spawn(move || {
                for i in 0..50 {
                    store.push("combo", format!("t{}-{}", t, i));
                    store.push(format!("layer-{}", t), format!("{}", i));
                }
            });
        }
    });

    let combo = store.history("combo");
    assert_eq!(combo.len(), MAX_HISTORY);
    assert!(combo.windows(2).all(|w| w[0].sequence < w[1].sequence));
    assert_eq!(store.cursor("combo"), Some(MAX_HISTORY - 1));
    for t in 0..8 {
        let layer = format!("layer-{}", t);
        assert_eq!(store.current(&layer).unwrap().content_ref.as_str(), "49");
    }
}

#[test]
fn test_concurrent_undo_redo_stays_in_range() {
    let store = LayerHistoryStore::new();
    push_many(&store, "object", 6);

    std::thread::scope(|scope| {
        for t in 0..4 {
            let store = &store;
            scope.spawn(move || {
                for _ in 0..100 {
                    if t % 2 == 0 {
                        let _ = store.undo("object");
                    } else {
                        let _ = store.redo("object");
                    }
                }
            });
        }
    });

    let cursor = store.cursor("object").unwrap();
    assert!(cursor < 6);
    assert_eq!(store.history("object").len(), 6);
}

#[test]
fn test_pushes_racing_removals_stay_consistent() {
    let store = LayerHistoryStore::new();

    std::thread::scope(|scope| {
        for t in 0..4 {
            let store = &store;
            scope.spawn(move || {
                for i in 0..100 {
                    store.push("light", format!("t{}-{}", t, i));
                }
            });
        }
        let store = &store;
        scope.spawn(move || {
            for _ in 0..100 {
                store.remove_layer("light");
            }
        });
    });

    let pushed = store.push("light", "last");
    assert_eq!(store.current("light").unwrap(), pushed);
    let history = store.history("light");
    assert!(history.len() <= MAX_HISTORY);
    assert!(history.windows(2).all(|w| w[0].sequence < w[1].sequence));
}

// === Persistence Tests ===

#[test]
fn test_session_roundtrip_keeps_cursor_and_sequence() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("scene.json");

    let store = LayerHistoryStore::new();
    push_many(&store, "object", 4);
    store.undo("object").unwrap();
    store.save(&path).unwrap();

    let loaded = LayerHistoryStore::load(&path).unwrap();
    assert_eq!(loaded.history("object"), store.history("object"));
    assert_eq!(loaded.cursor("object"), Some(2));
    assert!(loaded.can_redo("object"));

    let next = loaded.push("object", "v5");
    assert!(next.sequence > store.history("object")[3].sequence);
}

#[test]
fn test_load_or_default_applies_smaller_capacity() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("scene.json");

    let store = LayerHistoryStore::new();
    push_many(&store, "object", 12);
    for _ in 0..11 {
        store.undo("object").unwrap();
    }
    store.save(&path).unwrap();

    let loaded = LayerHistoryStore::load_or_default(&path, 3).unwrap();
    assert_eq!(loaded.capacity(), 3);
    assert_eq!(refs(&loaded, "object"), vec!["v10", "v11", "v12"]);
    assert_eq!(loaded.cursor("object"), Some(0));
}

#[test]
fn test_load_or_default_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = LayerHistoryStore::load_or_default(&temp_dir.path().join("none.json"), 5).unwrap();
    assert_eq!(store.capacity(), 5);
    assert!(store.layer_ids().is_empty());
}

#[test]
fn test_session_with_exhausted_sequence_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("scene.json");

    let store = LayerHistoryStore::new();
    store.push("object", "v1");
    let mut snapshot = store.snapshot();
    snapshot.next_sequence = u64::MAX;
    std::fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

    let err = LayerHistoryStore::load(&path).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_SNAPSHOT");
}
