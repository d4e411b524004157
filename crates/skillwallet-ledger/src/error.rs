//! Error types for ledger access.

use std::time::Duration;

use skillwallet_core::CoreError;
use thiserror::Error;

/// Errors that can occur while reading or mirroring a ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger did not answer in time.
    #[error("ledger request timed out after {0:?}")]
    Timeout(Duration),

    /// The ledger answered with something that is not a valid entry list.
    #[error("invalid ledger data: {0}")]
    InvalidData(String),

    /// Payload decoding error.
    #[error("decoding error: {0}")]
    Decode(#[from] CoreError),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding backend state was poisoned by a panicking writer.
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    /// Whether retrying the same read may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::Unavailable(_) | LedgerError::Timeout(_) | LedgerError::Io(_) => true,
            LedgerError::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
