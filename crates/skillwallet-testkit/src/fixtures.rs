//! Test fixtures and helpers.
//!
//! Ledgers written the way each historical writer wrote them, plus a
//! wrapper ledger for failure injection.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use skillwallet_core::key::derive_record_key;
use skillwallet_core::{record_hash, Keccak256Hash, LedgerEntry, RecordKey, SkillRecord};
use skillwallet_ledger::{LedgerError, LedgerReader, MemoryLedger, Result};

use crate::vectors::all_vectors;

/// The first golden vector's record.
pub fn sample_record() -> SkillRecord {
    all_vectors()[0].record()
}

/// A memory ledger with writers for every key variant.
pub struct LedgerFixture {
    pub ledger: Arc<MemoryLedger>,
}

impl LedgerFixture {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(MemoryLedger::new()),
        }
    }

    fn seconds(record: &SkillRecord) -> u64 {
        record.normalized_reviewed_at().seconds
    }

    fn put(&self, key: RecordKey, hash: Keccak256Hash) -> LedgerEntry {
        let entry = LedgerEntry::new(key, hash);
        self.ledger.push(entry).expect("memory ledger push");
        entry
    }

    /// What the current approval workflow writes.
    pub fn write(&self, record: &SkillRecord) -> LedgerEntry {
        let seconds = Self::seconds(record);
        self.put(
            derive_record_key(&record.custom_uid, &record.course_code, u128::from(seconds)),
            record_hash(record, seconds),
        )
    }

    /// A writer that keyed on milliseconds and hashed seconds.
    pub fn write_legacy_millis(&self, record: &SkillRecord) -> LedgerEntry {
        let seconds = Self::seconds(record);
        self.put(
            derive_record_key(&record.custom_uid, &record.course_code, u128::from(seconds) * 1000),
            record_hash(record, seconds),
        )
    }

    /// A writer that keyed with `t = 0`.
    pub fn write_zero_key(&self, record: &SkillRecord) -> LedgerEntry {
        let seconds = Self::seconds(record);
        self.put(
            derive_record_key(&record.custom_uid, &record.course_code, 0),
            record_hash(record, seconds),
        )
    }

    /// The canonical key with a hash that does not match the record.
    pub fn write_tampered(&self, record: &SkillRecord) -> LedgerEntry {
        let seconds = Self::seconds(record);
        let mut hash = *record_hash(record, seconds).as_bytes();
        hash[31] ^= 0x01;
        self.put(
            derive_record_key(&record.custom_uid, &record.course_code, u128::from(seconds)),
            Keccak256Hash::from_bytes(hash),
        )
    }

    /// Unrelated entries, as other students' records would appear.
    pub fn write_noise(&self, count: u8) {
        for i in 0..count {
            self.put(RecordKey::from_bytes([i; 32]), Keccak256Hash::from_bytes([!i; 32]));
        }
    }
}

impl Default for LedgerFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a ledger, counting reads and failing them on demand.
pub struct FlakyLedger<L> {
    inner: L,
    failing: AtomicBool,
    reads: AtomicUsize,
    lookup: bool,
}

impl<L: LedgerReader> FlakyLedger<L> {
    pub fn new(inner: L) -> Self {
        let lookup = inner.supports_lookup();
        Self {
            inner,
            failing: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
            lookup,
        }
    }

    /// Hide the inner ledger's by-key lookup.
    pub fn scan_only(mut self) -> Self {
        self.lookup = false;
        self
    }

    /// Make every following read fail with a transient error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Reads attempted so far, failed ones included.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn begin_read(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl<L: LedgerReader> LedgerReader for FlakyLedger<L> {
    async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        self.begin_read()?;
        self.inner.entries().await
    }

    async fn lookup(&self, key: &RecordKey) -> Result<Option<LedgerEntry>> {
        self.begin_read()?;
        if self.lookup {
            self.inner.lookup(key).await
        } else {
            let entries = self.inner.entries().await?;
            Ok(entries.into_iter().find(|e| e.record_key == *key))
        }
    }

    fn supports_lookup(&self) -> bool {
        self.lookup
    }

    fn backend(&self) -> &'static str {
        "flaky"
    }
}
