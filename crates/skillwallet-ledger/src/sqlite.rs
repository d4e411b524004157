//! SQLite mirror of a ledger.
//!
//! Holds one row per record key in first-seen order, so reads answer with
//! the same first-write semantics as the ledger it was copied from.
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use skillwallet_core::{CoreError, Keccak256Hash, LedgerEntry, RecordKey};

use crate::error::{LedgerError, Result};
use crate::migration::{self, now_millis};
use crate::traits::{InsertResult, LedgerReader};

/// SQLite-backed ledger mirror.
///
/// Thread-safe via internal Mutex.
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

/// Outcome of copying a ledger snapshot into the mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorReport {
    /// Entries in the source snapshot.
    pub entries: usize,
    pub inserted: usize,
    pub already_present: usize,
    /// Keys the mirror already held with a different hash.
    pub conflicts: usize,
}

/// A completed [`SqliteLedger::mirror_from`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRun {
    pub source: String,
    pub entries: u64,
    pub inserted: u64,
    pub conflicts: u64,
    /// Unix ms.
    pub completed_at: i64,
}

impl SqliteLedger {
    /// Open a SQLite database at the given path, creating and migrating it
    /// as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| LedgerError::LockPoisoned("sqlite connection"))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| LedgerError::Unavailable(format!("blocking task failed: {}", e)))?
    }

    /// Append one entry.
    pub async fn append(&self, entry: LedgerEntry) -> Result<InsertResult> {
        self.blocking(move |conn| append_entry(conn, &entry, now_millis()))
            .await
    }

    /// Append entries in order inside one transaction.
    pub async fn append_all(&self, entries: Vec<LedgerEntry>) -> Result<MirrorReport> {
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let report = append_batch(&tx, &entries)?;
            tx.commit()?;
            Ok(report)
        })
        .await
    }

    /// Copy a snapshot of `source` into the mirror and record the run.
    pub async fn mirror_from<R>(&self, source: &R) -> Result<MirrorReport>
    where
        R: LedgerReader + ?Sized,
    {
        let backend = source.backend();
        let entries = source.entries().await?;
        debug!(source = backend, entries = entries.len(), "mirroring ledger snapshot");

        let report = self
            .blocking(move |conn| {
                let tx = conn.transaction()?;
                let report = append_batch(&tx, &entries)?;
                tx.execute(
                    "INSERT INTO mirror_runs (source, entries, inserted, conflicts, completed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        backend,
                        report.entries as i64,
                        report.inserted as i64,
                        report.conflicts as i64,
                        now_millis()
                    ],
                )?;
                tx.commit()?;
                Ok(report)
            })
            .await?;

        info!(
            source = backend,
            entries = report.entries,
            inserted = report.inserted,
            conflicts = report.conflicts,
            "ledger mirror updated"
        );
        Ok(report)
    }

    /// The most recent mirror run, if any.
    pub async fn last_mirror_run(&self) -> Result<Option<MirrorRun>> {
        self.blocking(|conn| {
            let run = conn
                .query_row(
                    "SELECT source, entries, inserted, conflicts, completed_at
                     FROM mirror_runs ORDER BY run_id DESC LIMIT 1",
                    [],
                    |row| {
                        Ok(MirrorRun {
                            source: row.get(0)?,
                            entries: row.get::<_, i64>(1)? as u64,
                            inserted: row.get::<_, i64>(2)? as u64,
                            conflicts: row.get::<_, i64>(3)? as u64,
                            completed_at: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(run)
        })
        .await
    }

    /// Number of mirrored keys.
    pub async fn count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM ledger_entries", [], |row| row.get(0))?;
            Ok(n as u64)
        })
        .await
    }
}

fn append_batch(conn: &Connection, entries: &[LedgerEntry]) -> Result<MirrorReport> {
    let now = now_millis();
    let mut report = MirrorReport {
        entries: entries.len(),
        ..MirrorReport::default()
    };
    for entry in entries {
        match append_entry(conn, entry, now)? {
            InsertResult::Inserted => report.inserted += 1,
            InsertResult::AlreadyExists => report.already_present += 1,
            InsertResult::Conflict { .. } => report.conflicts += 1,
        }
    }
    Ok(report)
}

fn append_entry(conn: &Connection, entry: &LedgerEntry, now: i64) -> Result<InsertResult> {
    let existing: Option<[u8; 32]> = conn
        .query_row(
            "SELECT data_hash FROM ledger_entries WHERE record_key = ?1",
            params![entry.record_key.as_bytes().as_slice()],
            |row| blob32(row, 0),
        )
        .optional()?;

    match existing {
        Some(hash) if hash == *entry.data_hash.as_bytes() => Ok(InsertResult::AlreadyExists),
        Some(hash) => {
            let existing = Keccak256Hash::from_bytes(hash);
            warn!(
                record_key = %entry.record_key,
                existing = %existing.short(),
                incoming = %entry.data_hash.short(),
                "conflicting hash for mirrored key, keeping first write"
            );
            Ok(InsertResult::Conflict { existing })
        }
        None => {
            conn.execute(
                "INSERT INTO ledger_entries (record_key, data_hash, mirrored_at) VALUES (?1, ?2, ?3)",
                params![
                    entry.record_key.as_bytes().as_slice(),
                    entry.data_hash.as_bytes().as_slice(),
                    now
                ],
            )?;
            Ok(InsertResult::Inserted)
        }
    }
}

fn blob32(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<[u8; 32]> {
    let bytes: Vec<u8> = row.get(idx)?;
    let got = bytes.len();
    bytes.try_into().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Blob,
            Box::new(CoreError::InvalidLength { expected: 32, got }),
        )
    })
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    Ok(LedgerEntry::new(
        RecordKey::from_bytes(blob32(row, 0)?),
        Keccak256Hash::from_bytes(blob32(row, 1)?),
    ))
}

#[async_trait]
impl LedgerReader for SqliteLedger {
    async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        self.blocking(|conn| {
            let mut stmt =
                conn.prepare("SELECT record_key, data_hash FROM ledger_entries ORDER BY position")?;
            let entries = stmt
                .query_map([], row_to_entry)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
        .await
    }

    async fn lookup(&self, key: &RecordKey) -> Result<Option<LedgerEntry>> {
        let key = *key;
        self.blocking(move |conn| {
            let entry = conn
                .query_row(
                    "SELECT record_key, data_hash FROM ledger_entries WHERE record_key = ?1",
                    params![key.as_bytes().as_slice()],
                    row_to_entry,
                )
                .optional()?;
            Ok(entry)
        })
        .await
    }

    fn supports_lookup(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLedger;

    fn entry(key: u8, hash: u8) -> LedgerEntry {
        LedgerEntry::new(RecordKey::from_bytes([key; 32]), Keccak256Hash::from_bytes([hash; 32]))
    }

    #[tokio::test]
    async fn test_append_and_lookup() {
        let ledger = SqliteLedger::open_memory().unwrap();

        let result = ledger.append(entry(1, 10)).await.unwrap();
        assert_eq!(result, InsertResult::Inserted);

        let found = ledger.lookup(&RecordKey::from_bytes([1; 32])).await.unwrap();
        assert_eq!(found, Some(entry(1, 10)));
        assert!(ledger.lookup(&RecordKey::from_bytes([2; 32])).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_idempotent_append() {
        let ledger = SqliteLedger::open_memory().unwrap();

        assert_eq!(ledger.append(entry(1, 10)).await.unwrap(), InsertResult::Inserted);
        assert_eq!(ledger.append(entry(1, 10)).await.unwrap(), InsertResult::AlreadyExists);
        assert_eq!(ledger.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_conflict_keeps_first_write() {
        let ledger = SqliteLedger::open_memory().unwrap();
        ledger.append(entry(1, 10)).await.unwrap();

        let result = ledger.append(entry(1, 11)).await.unwrap();
        assert_eq!(
            result,
            InsertResult::Conflict {
                existing: Keccak256Hash::from_bytes([10; 32])
            }
        );

        let found = ledger.lookup(&RecordKey::from_bytes([1; 32])).await.unwrap();
        assert_eq!(found, Some(entry(1, 10)));
    }

    #[tokio::test]
    async fn test_entries_keep_order() {
        let ledger = SqliteLedger::open_memory().unwrap();
        let report = ledger
            .append_all(vec![entry(3, 30), entry(1, 10), entry(2, 20)])
            .await
            .unwrap();
        assert_eq!(report.inserted, 3);

        let entries = ledger.entries().await.unwrap();
        assert_eq!(entries, vec![entry(3, 30), entry(1, 10), entry(2, 20)]);
    }

    #[tokio::test]
    async fn test_mirror_from_memory() {
        let chain = MemoryLedger::from_entries([entry(1, 10), entry(2, 20), entry(1, 11), entry(2, 20)]);
        let mirror = SqliteLedger::open_memory().unwrap();

        let report = mirror.mirror_from(&chain).await.unwrap();
        assert_eq!(
            report,
            MirrorReport {
                entries: 4,
                inserted: 2,
                already_present: 1,
                conflicts: 1,
            }
        );

        // Same first-write answer as the source.
        for key in [1u8, 2] {
            let key = RecordKey::from_bytes([key; 32]);
            assert_eq!(mirror.lookup(&key).await.unwrap(), chain.lookup(&key).await.unwrap());
        }

        let run = mirror.last_mirror_run().await.unwrap().unwrap();
        assert_eq!(run.source, "memory");
        assert_eq!(run.entries, 4);
        assert_eq!(run.conflicts, 1);
    }

    #[tokio::test]
    async fn test_mirror_is_incremental() {
        let chain = MemoryLedger::from_entries([entry(1, 10)]);
        let mirror = SqliteLedger::open_memory().unwrap();
        mirror.mirror_from(&chain).await.unwrap();

        chain.push(entry(2, 20)).unwrap();
        let report = mirror.mirror_from(&chain).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.already_present, 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let ledger = SqliteLedger::open(&path).unwrap();
            ledger.append(entry(7, 70)).await.unwrap();
        }

        let ledger = SqliteLedger::open(&path).unwrap();
        assert_eq!(ledger.entries().await.unwrap(), vec![entry(7, 70)]);
        assert!(ledger.last_mirror_run().await.unwrap().is_none());
    }
}
