//! Durable `last_scanned` checkpoint (spec §4.2 step 5: "Persist
//! `last_scanned = confirmed_head` atomically with emission, to survive
//! restart without double-emit").
//!
//! This is local validator state, not shared coordination state, so it does
//! not go through `CoordinationStore` — but it is still a seam: a real
//! deployment backs it with the same embedded database the rest of the
//! node's local tables use. The in-memory implementation here is for tests
//! and for standalone operation where restart-safety is not required.

pub trait ScanCheckpoint: Send + Sync {
    fn load_last_scanned(&self) -> u64;
    fn save_last_scanned(&self, height: u64);
}

pub struct InMemoryCheckpoint {
    last_scanned: std::sync::atomic::AtomicU64,
}

impl InMemoryCheckpoint {
    pub fn starting_at(height: u64) -> Self {
        InMemoryCheckpoint {
            last_scanned: std::sync::atomic::AtomicU64::new(height),
        }
    }
}

impl ScanCheckpoint for InMemoryCheckpoint {
    fn load_last_scanned(&self) -> u64 {
        self.last_scanned.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn save_last_scanned(&self, height: u64) {
        self.last_scanned.store(height, std::sync::atomic::Ordering::SeqCst);
    }
}
