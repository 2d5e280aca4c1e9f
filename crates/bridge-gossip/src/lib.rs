//! Peer-to-peer gossip transport (spec §4.4, component C4 lower layer):
//! peer set, seen-message dedup, and at-most-once-relay propagation.
//! Carries opaque `GossipMessage`s; never inspects signature validity or
//! threshold state, which live one layer up in `bridge-aggregator`.

pub mod dedup;
pub mod gossip;
pub mod message;
pub mod transport;

pub use dedup::SeenMessages;
pub use gossip::{run_inbound_loop, GossipNetwork};
pub use message::{GossipMessage, Heartbeat, PeerAnnounce, SignatureBroadcast};
pub use transport::{GossipTransport, Libp2pGossipTransport, LoopbackTransport, TransportError};
