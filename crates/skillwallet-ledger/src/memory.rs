//! In-memory ledger.
//!
//! Models the contract's storage: an append-only list that accepts repeated
//! keys, the way `recordSkill` does. Lookups resolve to the first write.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use skillwallet_core::{Keccak256Hash, LedgerEntry, RecordKey};

use crate::error::{LedgerError, Result};
use crate::traits::LedgerReader;

/// In-memory ledger implementation. Thread-safe via RwLock.
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
}

#[derive(Default)]
struct MemoryLedgerInner {
    /// Entries in write order.
    entries: Vec<LedgerEntry>,

    /// Key -> position of its first write.
    first_write: HashMap<RecordKey, usize>,
}

impl MemoryLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryLedgerInner::default()),
        }
    }

    /// Create a ledger holding `entries` in the given order.
    pub fn from_entries(entries: impl IntoIterator<Item = LedgerEntry>) -> Self {
        let mut inner = MemoryLedgerInner::default();
        for entry in entries {
            inner.push(entry);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Append an entry. Repeated keys are kept; the first one wins lookups.
    pub fn push(&self, entry: LedgerEntry) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| LedgerError::LockPoisoned("memory ledger"))?;
        inner.push(entry);
        Ok(())
    }

    /// Convenience for `push(LedgerEntry::new(key, hash))`.
    pub fn record(&self, key: RecordKey, hash: Keccak256Hash) -> Result<()> {
        self.push(LedgerEntry::new(key, hash))
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MemoryLedgerInner {
    fn push(&mut self, entry: LedgerEntry) {
        let position = self.entries.len();
        self.first_write.entry(entry.record_key).or_insert(position);
        self.entries.push(entry);
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerReader for MemoryLedger {
    async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| LedgerError::LockPoisoned("memory ledger"))?;
        Ok(inner.entries.clone())
    }

    async fn lookup(&self, key: &RecordKey) -> Result<Option<LedgerEntry>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| LedgerError::LockPoisoned("memory ledger"))?;
        Ok(inner
            .first_write
            .get(key)
            .and_then(|&position| inner.entries.get(position))
            .copied())
    }

    fn supports_lookup(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
