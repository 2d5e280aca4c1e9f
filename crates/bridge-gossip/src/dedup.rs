//! Seen-message dedup with a retention window, grounded on the teacher's
//! `GossipProtocol::seen_messages` / `is_duplicate` pattern (same intent,
//! concurrent map instead of a mutex-guarded `HashMap` since this crate's
//! ambient concurrency primitive is `dashmap`, not `parking_lot`).

use std::time::{Duration, Instant};

use dashmap::DashMap;

pub struct SeenMessages {
    seen: DashMap<String, Instant>,
    retention: Duration,
}

impl SeenMessages {
    pub fn new(retention: Duration) -> Self {
        SeenMessages { seen: DashMap::new(), retention }
    }

    /// Returns `true` and records the key if this is the first time it has
    /// been seen; returns `false` (already seen) otherwise. Re-broadcast
    /// happens exactly once, on the `true` branch (spec §4.4(c)).
    pub fn record_if_new(&self, key: &str) -> bool {
        if self.seen.contains_key(key) {
            return false;
        }
        self.seen.insert(key.to_string(), Instant::now());
        true
    }

    /// Drops entries older than the retention window. Call periodically;
    /// never called from `record_if_new` itself so the hot path stays O(1).
    pub fn evict_expired(&self) {
        let cutoff = Instant::now();
        self.seen.retain(|_, seen_at| cutoff.duration_since(*seen_at) < self.retention);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sight_is_new_second_is_not() {
        let seen = SeenMessages::new(Duration::from_secs(60));
        assert!(seen.record_if_new("a"));
        assert!(!seen.record_if_new("a"));
    }
}
