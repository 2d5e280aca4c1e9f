//! Liveness ordering (spec §4.5: "transfers are submitted in `(deadline
//! asc, observed_at asc)` order to prevent starvation"). A min-heap over
//! `Reverse` so the nearest deadline pops first.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use bridge_aggregator::AuthorizedBundle;

#[derive(Debug, Eq, PartialEq)]
struct Entry {
    deadline: i64,
    observed_at: i64,
    bundle: AuthorizedBundleKey,
}

/// Only the ordering fields are compared; the bundle itself carries no
/// `Ord` impl and shouldn't need one just to sit in this heap.
#[derive(Debug)]
struct AuthorizedBundleKey(AuthorizedBundle);

impl PartialEq for AuthorizedBundleKey {
    fn eq(&self, _other: &Self) -> bool { true }
}
impl Eq for AuthorizedBundleKey {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.deadline, self.observed_at).cmp(&(other.deadline, other.observed_at))
    }
}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
pub struct ExecutionQueue {
    heap: BinaryHeap<Reverse<Entry>>,
}

impl ExecutionQueue {
    pub fn new() -> Self {
        ExecutionQueue::default()
    }

    pub fn push(&mut self, bundle: AuthorizedBundle) {
        let deadline = bundle.transfer.deadline;
        let observed_at = bundle.transfer.observed_at;
        self.heap.push(Reverse(Entry { deadline, observed_at, bundle: AuthorizedBundleKey(bundle) }));
    }

    /// Pops the bundle with the nearest deadline (ties broken by earliest
    /// `observed_at`).
    pub fn pop(&mut self) -> Option<AuthorizedBundle> {
        self.heap.pop().map(|Reverse(entry)| entry.bundle.0)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::{ChainId, Direction, HexBytes, Transfer};

    fn bundle(deadline: i64, observed_at: i64, salt: u8) -> AuthorizedBundle {
        let transfer = Transfer::new(
            Direction::L1ToL2,
            ChainId(1),
            ChainId(2),
            100,
            HexBytes(vec![1; 20]),
            HexBytes(vec![2; 20]),
            1000,
            HexBytes(vec![salt; 32]),
            0,
            1,
            observed_at,
            deadline,
        )
        .unwrap();
        AuthorizedBundle { transfer, signatures: vec![] }
    }

    #[test]
    fn pops_nearest_deadline_first() {
        let mut queue = ExecutionQueue::new();
        queue.push(bundle(5000, 100, 1));
        queue.push(bundle(1000, 100, 2));
        queue.push(bundle(3000, 100, 3));

        assert_eq!(queue.pop().unwrap().transfer.deadline, 1000);
        assert_eq!(queue.pop().unwrap().transfer.deadline, 3000);
        assert_eq!(queue.pop().unwrap().transfer.deadline, 5000);
    }

    #[test]
    fn breaks_deadline_ties_by_observed_at() {
        let mut queue = ExecutionQueue::new();
        queue.push(bundle(1000, 200, 1));
        queue.push(bundle(1000, 100, 2));

        assert_eq!(queue.pop().unwrap().transfer.observed_at, 100);
        assert_eq!(queue.pop().unwrap().transfer.observed_at, 200);
    }
}
