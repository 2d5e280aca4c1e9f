//! Event validation pipeline (spec §4.3, component C3): accepts or rejects
//! an observed transfer through six ordered, short-circuiting checks.
//!
//! This crate owns none of its collaborators' state — source-chain
//! re-query, policy/volume tables, and security vetoes are all injected as
//! trait objects (`collaborators`) so this crate stays a pure decision
//! function over a `Transfer` plus whatever those collaborators report.

pub mod collaborators;
pub mod pipeline;
pub mod replay;

pub use collaborators::{PolicyStore, ProofCheckError, SecuritySignals, SourceProofChecker, VolumeLedger};
pub use pipeline::{EventValidator, ValidationOutcome, ValidatorConfig};
pub use replay::{AntiReplayTable, ReplayRejection};
