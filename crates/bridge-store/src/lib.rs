//! Coordination store and snapshot persistence (spec §4.6, §6). Holds state
//! shared across components that is not owned by a single transfer's
//! signature set: the peer directory, the nonce table, and the snapshot
//! history used for emergency rollback.

pub mod coordination_store;
pub mod snapshot_store;

pub use coordination_store::{CoordinationStore, InMemoryCoordinationStore};
pub use snapshot_store::{SnapshotRetentionConfig, SnapshotStore, SnapshotStoreError};
