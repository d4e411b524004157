//! Verification results.

use serde::{Deserialize, Serialize};
use std::fmt;

use skillwallet_core::Keccak256Hash;

use crate::trace::VerificationTrace;

/// Why a record did not verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No candidate key is on the ledger.
    RecordNotFound,
    /// A candidate key is on the ledger with a different hash.
    HashMismatch,
    /// The ledger could not be read; retrying may succeed.
    TransientIo,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::RecordNotFound => "RecordNotFound",
            ErrorKind::HashMismatch => "HashMismatch",
            ErrorKind::TransientIo => "TransientIo",
        };
        f.write_str(s)
    }
}

/// What the caller shows the user. Never conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Verified,
    NotVerified,
    Unavailable,
}

/// Outcome of verifying one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    /// Hash of the record as held by the document store.
    pub database_hash: Keccak256Hash,
    /// Hash the ledger holds under the matched key.
    pub blockchain_hash: Option<Keccak256Hash>,
    pub matched_variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<VerificationTrace>,
}

impl VerificationResult {
    pub(crate) fn verified(local: Keccak256Hash, variant: &str) -> Self {
        Self {
            is_valid: true,
            database_hash: local,
            blockchain_hash: Some(local),
            matched_variant: Some(variant.to_string()),
            error: None,
            message: format!("record matches the ledger ({} key)", variant),
            trace: None,
        }
    }

    pub(crate) fn mismatch(local: Keccak256Hash, remote: Keccak256Hash, variant: &str) -> Self {
        Self {
            is_valid: false,
            database_hash: local,
            blockchain_hash: Some(remote),
            matched_variant: Some(variant.to_string()),
            error: Some(ErrorKind::HashMismatch),
            message: format!(
                "record differs from the ledger ({} key): database {} vs ledger {}",
                variant,
                local.short(),
                remote.short()
            ),
            trace: None,
        }
    }

    pub(crate) fn not_found(local: Keccak256Hash) -> Self {
        Self {
            is_valid: false,
            database_hash: local,
            blockchain_hash: None,
            matched_variant: None,
            error: Some(ErrorKind::RecordNotFound),
            message: "record not found on the ledger".to_string(),
            trace: None,
        }
    }

    /// The ledger read failed. The outcome is `Unavailable` either way; the
    /// message only tells a flaky node apart from a misconfigured one.
    pub(crate) fn unavailable(local: Keccak256Hash, reason: &str, transient: bool) -> Self {
        let message = if transient {
            format!("ledger temporarily unavailable, retry later: {}", reason)
        } else {
            format!(
                "ledger could not be read, check the node url and contract address: {}",
                reason
            )
        };
        Self {
            is_valid: false,
            database_hash: local,
            blockchain_hash: None,
            matched_variant: None,
            error: Some(ErrorKind::TransientIo),
            message,
            trace: None,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match (self.is_valid, self.error) {
            (true, _) => Outcome::Verified,
            (false, Some(ErrorKind::TransientIo)) => Outcome::Unavailable,
            (false, _) => Outcome::NotVerified,
        }
    }

    /// Whether the same call may succeed later.
    pub fn is_retryable(&self) -> bool {
        self.outcome() == Outcome::Unavailable
    }
}
