//! Audit trace of a single verification.

use serde::{Deserialize, Serialize};

use skillwallet_core::{CandidateKey, RecordKey, TimestampSource};

/// How the ledger was consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStrategy {
    /// One by-key lookup per candidate, stopping at the first hit.
    Index,
    /// One snapshot, scanned per candidate.
    Scan,
}

/// One candidate key and whether the ledger held it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTrace {
    pub variant: String,
    /// Timestamp component of the key preimage, as a decimal string.
    pub timestamp: String,
    pub record_key: RecordKey,
    /// `None` when matching stopped before this candidate was tried.
    pub found: Option<bool>,
}

impl CandidateTrace {
    pub(crate) fn untried(candidate: &CandidateKey) -> Self {
        Self {
            variant: candidate.variant.to_string(),
            timestamp: candidate.timestamp.to_string(),
            record_key: candidate.key,
            found: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationTrace {
    pub record_id: String,
    pub reviewed_at: u64,
    pub timestamp_source: TimestampSource,
    pub ledger_backend: String,
    pub lookup: LookupStrategy,
    /// Candidates in priority order.
    pub candidates: Vec<CandidateTrace>,
    /// Snapshot size when the ledger was scanned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries_scanned: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_variant: Option<String>,
}
