//! LedgerReader trait: the interface the verifier reads the ledger through.

use std::sync::Arc;

use async_trait::async_trait;
use skillwallet_core::{Keccak256Hash, LedgerEntry, RecordKey};

use crate::error::Result;

/// Result of appending an entry to an append-only mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Entry was new.
    Inserted,
    /// The same `(key, hash)` pair was already present.
    AlreadyExists,
    /// The key is present with a different hash. The existing hash is kept.
    Conflict {
        /// The hash stored under the key.
        existing: Keccak256Hash,
    },
}

/// Read access to a ledger of `(recordKey, dataHash)` entries.
///
/// # Contract
///
/// - `entries` returns a fresh, finite snapshot in ledger order on every call.
/// - `lookup` returns the first entry in ledger order with the given key.
///   The default scans one snapshot; backends with an index override it and
///   report so through `supports_lookup`.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Snapshot of every entry, in ledger order.
    async fn entries(&self) -> Result<Vec<LedgerEntry>>;

    /// First entry with `key`, if any.
    async fn lookup(&self, key: &RecordKey) -> Result<Option<LedgerEntry>> {
        let entries = self.entries().await?;
        Ok(entries.into_iter().find(|e| e.record_key == *key))
    }

    /// Whether `lookup` is served without a full snapshot.
    fn supports_lookup(&self) -> bool {
        false
    }

    /// Backend name for logs and traces.
    fn backend(&self) -> &'static str;
}

#[async_trait]
impl<L: LedgerReader + ?Sized> LedgerReader for Arc<L> {
    async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        (**self).entries().await
    }

    async fn lookup(&self, key: &RecordKey) -> Result<Option<LedgerEntry>> {
        (**self).lookup(key).await
    }

    fn supports_lookup(&self) -> bool {
        (**self).supports_lookup()
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}
