//! Shared data model for the bridge validator node.
//!
//! Every other crate in the workspace depends on this one for the `Transfer`
//! data model, the canonical signing encoding (spec §6), and the shared error
//! taxonomy (spec §7). Nothing here talks to a network, a chain, or a clock —
//! that belongs to the crates that own those concerns.

pub mod emergency;
pub mod error;
pub mod health;
pub mod peer;
pub mod round;
pub mod signature;
pub mod snapshot;
pub mod transfer;

pub use emergency::{
    EmergencyEvent, EmergencyEventId, EmergencySeverity, IncidentKind, ResponseAction,
    ResponseStatus,
};
pub use error::{CoreError, CoreResult};
pub use health::HealthEvent;
pub use peer::{PeerCapabilities, ValidatorPeer};
pub use round::ConsensusRound;
pub use signature::ValidatorSignature;
pub use snapshot::StateSnapshot;
pub use transfer::{ChainId, Direction, HexBytes, RejectionReason, Transfer, TransferId, TransferStatus};
