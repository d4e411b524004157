//! Error types for verification.

use skillwallet_core::ValidationError;
use thiserror::Error;

/// Errors raised at the call boundary, before any ledger access.
///
/// Ledger failures are not errors: they come back as a
/// [`VerificationResult`](crate::VerificationResult) with outcome
/// `Unavailable`.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The record does not have the shape the encoding contract needs.
    #[error("malformed record: {0}")]
    MalformedRecord(#[from] ValidationError),

    /// The record source has no record with this id.
    #[error("record {0} not found in record source")]
    UnknownRecord(String),

    /// The record source failed.
    #[error("record source error: {0}")]
    Source(#[from] SourceError),
}

/// Errors from a [`RecordSource`](crate::RecordSource).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid record file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("record file must be a JSON object mapping ids to records")]
    NotAnObject,

    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
}

/// Result type for verification calls.
pub type Result<T> = std::result::Result<T, VerifyError>;
