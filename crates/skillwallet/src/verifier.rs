//! The IntegrityVerifier: compares a record against its ledger entry.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use skillwallet_core::{record_hash, CandidateKey, Keccak256Hash, LedgerEntry, RecordKeyDeriver, SkillRecord};
use skillwallet_ledger::{LedgerError, LedgerReader};

use crate::config::{LookupMode, VerifierConfig};
use crate::error::{Result, VerifyError};
use crate::result::VerificationResult;
use crate::source::RecordSource;
use crate::trace::{CandidateTrace, LookupStrategy, VerificationTrace};

/// Verifies skill records against a ledger.
///
/// Holds no mutable state; calls are independent and may run concurrently.
pub struct IntegrityVerifier<L: LedgerReader + ?Sized> {
    /// The ledger backend.
    ledger: Arc<L>,
    /// Candidate key strategies, in priority order.
    deriver: RecordKeyDeriver,
    config: VerifierConfig,
}

/// The first candidate the ledger holds, with its entry.
struct Match<'a> {
    candidate: &'a CandidateKey,
    entry: LedgerEntry,
}

impl<L: LedgerReader + ?Sized> IntegrityVerifier<L> {
    /// Create a verifier with the default key strategies.
    pub fn new(ledger: Arc<L>, config: VerifierConfig) -> Self {
        Self {
            ledger,
            deriver: RecordKeyDeriver::default(),
            config,
        }
    }

    /// Replace the key strategies.
    pub fn with_deriver(mut self, deriver: RecordKeyDeriver) -> Self {
        self.deriver = deriver;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entry points
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify a typed record.
    ///
    /// Returns `Err` only for a malformed record, before any ledger access.
    /// Ledger failures produce a result with outcome `Unavailable`.
    #[instrument(skip(self, record), fields(record_id = %id, backend = self.ledger.backend()))]
    pub async fn verify(&self, record: &SkillRecord, id: &str) -> Result<VerificationResult> {
        record.validate()?;

        let reviewed_at = record.normalized_reviewed_at();
        if reviewed_at.is_degenerate() {
            warn!(source = %reviewed_at.source, "reviewedAt unusable, encoding as 0");
        }

        let local = record_hash(record, reviewed_at.seconds);
        let candidates = self
            .deriver
            .derive(&record.custom_uid, &record.course_code, reviewed_at.seconds);
        debug!(
            local = %local.short(),
            reviewed_at = reviewed_at.seconds,
            source = %reviewed_at.source,
            candidates = candidates.len(),
            "record encoded"
        );

        let strategy = self.strategy();
        let mut trace = self.config.collect_trace.then(|| VerificationTrace {
            record_id: id.to_string(),
            reviewed_at: reviewed_at.seconds,
            timestamp_source: reviewed_at.source,
            ledger_backend: self.ledger.backend().to_string(),
            lookup: strategy,
            candidates: candidates.iter().map(CandidateTrace::untried).collect(),
            entries_scanned: None,
            matched_variant: None,
        });

        let found = match strategy {
            LookupStrategy::Index => self.find_by_lookup(&candidates, trace.as_mut()).await,
            LookupStrategy::Scan => self.find_by_scan(&candidates, trace.as_mut()).await,
        };

        let mut result = match found {
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "ledger read failed");
                VerificationResult::unavailable(local, &e.to_string(), e.is_transient())
            }
            Ok(None) => {
                info!(local = %local.short(), "record not found on ledger");
                VerificationResult::not_found(local)
            }
            Ok(Some(m)) => self.classify(local, &m),
        };

        if let Some(trace) = trace.as_mut() {
            trace.matched_variant = result.matched_variant.clone();
        }
        result.trace = trace;
        Ok(result)
    }

    /// Validate a raw document, then verify it.
    pub async fn verify_document(&self, doc: &Value, id: &str) -> Result<VerificationResult> {
        let record = SkillRecord::from_document(doc)?;
        self.verify(&record, id).await
    }

    /// Fetch a record from `source`, then verify it.
    pub async fn verify_from_source(&self, source: &dyn RecordSource, id: &str) -> Result<VerificationResult> {
        let doc = source
            .get_record(id)
            .await?
            .ok_or_else(|| VerifyError::UnknownRecord(id.to_string()))?;
        self.verify_document(&doc, id).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Matching
    // ─────────────────────────────────────────────────────────────────────────

    fn strategy(&self) -> LookupStrategy {
        match self.config.lookup {
            LookupMode::Auto if self.ledger.supports_lookup() => LookupStrategy::Index,
            _ => LookupStrategy::Scan,
        }
    }

    /// Sequential lookups keep priority order: the first hit wins.
    async fn find_by_lookup<'a>(
        &self,
        candidates: &'a [CandidateKey],
        mut trace: Option<&mut VerificationTrace>,
    ) -> std::result::Result<Option<Match<'a>>, LedgerError> {
        for (i, candidate) in candidates.iter().enumerate() {
            let entry = self.ledger.lookup(&candidate.key).await?;
            if let Some(t) = trace.as_deref_mut() {
                t.candidates[i].found = Some(entry.is_some());
            }
            if let Some(entry) = entry {
                return Ok(Some(Match { candidate, entry }));
            }
        }
        Ok(None)
    }

    /// One snapshot; for each candidate, the first entry in ledger order.
    async fn find_by_scan<'a>(
        &self,
        candidates: &'a [CandidateKey],
        mut trace: Option<&mut VerificationTrace>,
    ) -> std::result::Result<Option<Match<'a>>, LedgerError> {
        let entries = self.ledger.entries().await?;
        if let Some(t) = trace.as_deref_mut() {
            t.entries_scanned = Some(entries.len());
        }

        for (i, candidate) in candidates.iter().enumerate() {
            let entry = entries.iter().find(|e| e.record_key == candidate.key).copied();
            if let Some(t) = trace.as_deref_mut() {
                t.candidates[i].found = Some(entry.is_some());
            }
            if let Some(entry) = entry {
                return Ok(Some(Match { candidate, entry }));
            }
        }
        Ok(None)
    }

    fn classify(&self, local: Keccak256Hash, m: &Match<'_>) -> VerificationResult {
        let variant = m.candidate.variant;
        let remote = m.entry.data_hash;
        if local == remote {
            info!(variant, hash = %local.short(), "record verified");
            VerificationResult::verified(local, variant)
        } else {
            warn!(
                variant,
                local = %local.short(),
                remote = %remote.short(),
                "record hash differs from ledger"
            );
            VerificationResult::mismatch(local, remote, variant)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillwallet_core::key::{derive_record_key, CANONICAL};
    use skillwallet_ledger::MemoryLedger;

    fn record() -> SkillRecord {
        SkillRecord::builder("s-1", "CS101")
            .skill("Rust", 5)
            .reviewed_at(1700000000i64)
            .build()
    }

    #[tokio::test]
    async fn test_verify_canonical() {
        let record = record();
        let ledger = Arc::new(MemoryLedger::new());
        ledger.push(record.ledger_entry().unwrap()).unwrap();

        let verifier = IntegrityVerifier::new(ledger, VerifierConfig::default());
        let result = verifier.verify(&record, "job-1").await.unwrap();
        assert!(result.is_valid);
        assert_eq!(result.matched_variant.as_deref(), Some(CANONICAL));
        assert!(result.trace.is_none());
    }

    #[tokio::test]
    async fn test_trace_records_lookup() {
        let record = record();
        let ledger = Arc::new(MemoryLedger::new());
        ledger.push(record.ledger_entry().unwrap()).unwrap();

        let verifier = IntegrityVerifier::new(ledger, VerifierConfig::default().with_trace());
        let trace = verifier.verify(&record, "job-1").await.unwrap().trace.unwrap();
        assert_eq!(trace.lookup, LookupStrategy::Index);
        assert_eq!(trace.candidates[0].found, Some(true));
        assert_eq!(trace.candidates[1].found, None);
        assert_eq!(trace.entries_scanned, None);
        assert_eq!(
            trace.candidates[0].record_key,
            derive_record_key("s-1", "CS101", 1700000000)
        );
    }

    #[tokio::test]
    async fn test_scan_mode_forced() {
        let record = record();
        let ledger = Arc::new(MemoryLedger::new());
        ledger.push(record.ledger_entry().unwrap()).unwrap();

        let config = VerifierConfig::default().with_trace().with_lookup(LookupMode::Scan);
        let verifier = IntegrityVerifier::new(ledger, config);
        let trace = verifier.verify(&record, "job-1").await.unwrap().trace.unwrap();
        assert_eq!(trace.lookup, LookupStrategy::Scan);
        assert_eq!(trace.entries_scanned, Some(1));
    }

    #[tokio::test]
    async fn test_dyn_ledger() {
        let record = record();
        let memory = MemoryLedger::new();
        memory.push(record.ledger_entry().unwrap()).unwrap();
        let ledger: Arc<dyn LedgerReader> = Arc::new(memory);

        let verifier = IntegrityVerifier::new(ledger, VerifierConfig::default());
        assert!(verifier.verify(&record, "job-1").await.unwrap().is_valid);
    }
}
