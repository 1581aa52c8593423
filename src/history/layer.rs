//! Bounded version window with an undo/redo cursor for a single layer.

use std::collections::VecDeque;

use super::version::Version;
use super::NotFoundReason;

/// History of one layer: the most recent `capacity` versions, oldest first,
/// plus a cursor marking the current one.
///
/// `cursor` is `None` exactly when `versions` is empty.
#[derive(Debug, Clone)]
pub struct LayerHistory {
    versions: VecDeque<Version>,
    cursor: Option<usize>,
    capacity: usize,
}

impl LayerHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            versions: VecDeque::with_capacity(capacity),
            cursor: None,
            capacity,
        }
    }

    /// Rebuild a history from persisted parts.
    ///
    /// Returns a description of the first violated invariant on failure.
    pub(crate) fn from_parts(
        versions: Vec<Version>,
        cursor: Option<usize>,
        capacity: usize,
    ) -> std::result::Result<Self, String> {
        if capacity == 0 {
            return Err("capacity must be at least 1".to_string());
        }
        if versions.len() > capacity {
            return Err(format!(
                "{} versions exceed capacity {}",
                versions.len(),
                capacity
            ));
        }
        match cursor {
            None if !versions.is_empty() => {
                return Err("missing cursor for non-empty history".to_string())
            }
            Some(_) if versions.is_empty() => {
                return Err("cursor set on empty history".to_string())
            }
            Some(p) if p >= versions.len() => {
                return Err(format!(
                    "cursor {} out of bounds for {} versions",
                    p,
                    versions.len()
                ))
            }
            _ => {}
        }
        if versions.windows(2).any(|w| w[0].sequence >= w[1].sequence) {
            return Err("version sequences are not strictly increasing".to_string());
        }

        Ok(Self {
            versions: versions.into(),
            cursor,
            capacity,
        })
    }

    /// Append a version and make it current.
    ///
    /// Versions newer than the cursor are discarded first. Returns the versions
    /// evicted from the front to stay within capacity.
    pub fn push(&mut self, version: Version) -> Vec<Version> {
        if let Some(p) = self.cursor {
            self.versions.truncate(p + 1);
        }
        self.versions.push_back(version);
        self.cursor = Some(self.versions.len() - 1);
        self.evict_overflow()
    }

    pub fn current(&self) -> Result<&Version, NotFoundReason> {
        self.cursor
            .and_then(|p| self.versions.get(p))
            .ok_or(NotFoundReason::Empty)
    }

    pub fn undo(&mut self) -> Result<&Version, NotFoundReason> {
        match self.cursor {
            None => Err(NotFoundReason::Empty),
            Some(0) => Err(NotFoundReason::AtOldest),
            Some(p) => {
                self.cursor = Some(p - 1);
                Ok(&self.versions[p - 1])
            }
        }
    }

    pub fn redo(&mut self) -> Result<&Version, NotFoundReason> {
        match self.cursor {
            None => Err(NotFoundReason::Empty),
            Some(p) if p + 1 >= self.versions.len() => Err(NotFoundReason::AtNewest),
            Some(p) => {
                self.cursor = Some(p + 1);
                Ok(&self.versions[p + 1])
            }
        }
    }

    /// Change the bound, evicting the oldest versions if needed.
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<Version> {
        self.capacity = capacity.max(1);
        self.evict_overflow()
    }

    fn evict_overflow(&mut self) -> Vec<Version> {
        let mut evicted = Vec::new();
        while self.versions.len() > self.capacity {
            if let Some(oldest) = self.versions.pop_front() {
                evicted.push(oldest);
            }
            // Keep the same logical version current; if it was the evicted
            // one, clamp to the new oldest.
            self.cursor = self.cursor.map(|p| p.saturating_sub(1));
        }
        evicted
    }

    pub fn versions(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(p) if p > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(p) if p + 1 < self.versions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ContentRef;

    fn version(seq: u64) -> Version {
        Version::new(seq, ContentRef::new(format!("v{}", seq)), None)
    }

    fn contents(history: &LayerHistory) -> Vec<String> {
        history
            .versions()
            .map(|v| v.content_ref.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_new_history_is_empty() {
        let history = LayerHistory::new(12);
        assert!(history.is_empty());
        assert_eq!(history.cursor(), None);
        assert_eq!(history.current(), Err(NotFoundReason::Empty));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut history = LayerHistory::new(0);
        assert_eq!(history.capacity(), 1);
        history.push(version(1));
        history.push(version(2));
        assert_eq!(contents(&history), vec!["v2"]);
    }

    #[test]
    fn test_push_returns_evicted() {
        let mut history = LayerHistory::new(2);
        assert!(history.push(version(1)).is_empty());
        assert!(history.push(version(2)).is_empty());
        let evicted = history.push(version(3));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].sequence, 1);
        assert_eq!(history.cursor(), Some(1));
    }

    #[test]
    fn test_undo_failure_does_not_move_cursor() {
        let mut history = LayerHistory::new(12);
        history.push(version(1));
        assert_eq!(history.undo(), Err(NotFoundReason::AtOldest));
        assert_eq!(history.cursor(), Some(0));
        assert_eq!(history.redo(), Err(NotFoundReason::AtNewest));
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn test_shrinking_capacity_keeps_cursor_on_same_version() {
        let mut history = LayerHistory::new(5);
        for seq in 1..=5 {
            history.push(version(seq));
        }
        history.undo().unwrap();
        assert_eq!(history.current().unwrap().sequence, 4);

        let evicted = history.set_capacity(3);
        assert_eq!(evicted.len(), 2);
        assert_eq!(contents(&history), vec!["v3", "v4", "v5"]);
        assert_eq!(history.current().unwrap().sequence, 4);
    }

    #[test]
    fn test_evicting_cursor_entry_clamps_to_oldest() {
        let mut history = LayerHistory::new(4);
        for seq in 1..=4 {
            history.push(version(seq));
        }
        while history.undo().is_ok() {}
        assert_eq!(history.cursor(), Some(0));

        history.set_capacity(3);
        assert_eq!(history.cursor(), Some(0));
        assert_eq!(history.current().unwrap().sequence, 2);
    }

    #[test]
    fn test_from_parts_rejects_bad_cursor() {
        let result = LayerHistory::from_parts(vec![version(1)], Some(1), 12);
        assert!(result.is_err());

        let result = LayerHistory::from_parts(vec![version(1)], None, 12);
        assert!(result.is_err());

        let result = LayerHistory::from_parts(vec![], Some(0), 12);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_parts_rejects_unordered_sequences() {
        let result = LayerHistory::from_parts(vec![version(2), version(1)], Some(1), 12);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_parts_rejects_overflow() {
        let versions = (1..=4).map(version).collect();
        let result = LayerHistory::from_parts(versions, Some(3), 3);
        assert!(result.is_err());
    }
}
