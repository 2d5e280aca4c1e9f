//! Shared error taxonomy (spec §7).
//!
//! `CoreError` covers failures in constructing or encoding the data model
//! itself. Per-component error enums (validation rejection reasons, RPC
//! failures, recovery preconditions, ...) live in their owning crates and are
//! never collapsed into this one — each task keeps a closed error type so
//! callers can match exhaustively rather than string-match a shared catch-all.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("transfer amount must be > 0")]
    ZeroAmount,

    #[error("transfer deadline ({deadline}) must be after observed_at ({observed_at})")]
    DeadlineNotAfterObserved { observed_at: i64, deadline: i64 },

    #[error("address field must not be empty")]
    EmptyAddress,

    #[error("source_tx_hash must not be empty")]
    EmptyTxHash,
}

pub type CoreResult<T> = Result<T, CoreError>;
