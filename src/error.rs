//! Typed failure conditions that callers need to match on.
//!
//! Most fallible paths propagate `anyhow::Error`; the oracle gap is the one
//! condition the pipeline inspects to decide between degrading an event
//! (skip USD-denominated fields) and failing the batch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    /// No reference-price bucket exists within the bounded search window.
    #[error("no reference price within {window_secs}s at or before bucket {bucket}")]
    Gap { bucket: u64, window_secs: u64 },

    /// The underlying store failed; propagates to the ingestion engine's
    /// retry policy.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
