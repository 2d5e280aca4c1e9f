//! Snapshot retention and restore (spec §4.6, §9 Open Question on snapshot
//! granularity — resolved in `bridge_core::snapshot`). Grounded on the
//! teacher's `SnapshotConfig` validation pattern (reject nonsensical
//! configuration at construction rather than at first use).

use bridge_core::StateSnapshot;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotStoreError {
    #[error("max_retained must be greater than zero")]
    ZeroRetention,
}

#[derive(Debug, Clone)]
pub struct SnapshotRetentionConfig {
    pub max_retained: usize,
}

impl SnapshotRetentionConfig {
    pub fn new(max_retained: usize) -> Result<Self, SnapshotStoreError> {
        if max_retained == 0 {
            return Err(SnapshotStoreError::ZeroRetention);
        }
        Ok(SnapshotRetentionConfig { max_retained })
    }
}

/// Ring buffer of the most recent `StateSnapshot`s, newest last. Triggers
/// per spec §4.6 are the caller's responsibility: entering emergency mode,
/// a periodic timer, and immediately before any rollback.
pub struct SnapshotStore {
    retention: SnapshotRetentionConfig,
    history: Mutex<VecDeque<StateSnapshot>>,
}

impl SnapshotStore {
    pub fn new(retention: SnapshotRetentionConfig) -> Self {
        SnapshotStore { retention, history: Mutex::new(VecDeque::new()) }
    }

    pub fn take(&self, snapshot: StateSnapshot) {
        let mut history = self.history.lock().unwrap();
        history.push_back(snapshot);
        while history.len() > self.retention.max_retained {
            history.pop_front();
        }
    }

    pub fn latest(&self) -> Option<StateSnapshot> {
        self.history.lock().unwrap().back().cloned()
    }

    /// Finds the most recent snapshot at or before `at_or_before_unix_ms`,
    /// for rollback-to-a-point-in-time.
    pub fn restore_at_or_before(&self, at_or_before_unix_ms: i64) -> Option<StateSnapshot> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|s| s.taken_at <= at_or_before_unix_ms)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn snapshot(taken_at: i64) -> StateSnapshot {
        StateSnapshot::seal(taken_at, vec![], HashMap::new(), vec![], HashMap::new(), vec![])
    }

    #[test]
    fn evicts_oldest_beyond_retention() {
        let store = SnapshotStore::new(SnapshotRetentionConfig::new(2).unwrap());
        store.take(snapshot(1));
        store.take(snapshot(2));
        store.take(snapshot(3));
        assert_eq!(store.len(), 2);
        assert_eq!(store.latest().unwrap().taken_at, 3);
    }

    #[test]
    fn restores_most_recent_at_or_before_cutoff() {
        let store = SnapshotStore::new(SnapshotRetentionConfig::new(5).unwrap());
        store.take(snapshot(100));
        store.take(snapshot(200));
        store.take(snapshot(300));
        let restored = store.restore_at_or_before(250).unwrap();
        assert_eq!(restored.taken_at, 200);
    }
}
