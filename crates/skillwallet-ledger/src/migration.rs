//! Database schema migrations for the SQLite mirror.
//!
//! Each migration transforms the schema from version N-1 to N.

use rusqlite::Connection;

use crate::error::{LedgerError, Result};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 2;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(LedgerError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        2 => apply_v2(conn),
        _ => Err(LedgerError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: mirrored entries.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per record key, in the order first seen
        CREATE TABLE ledger_entries (
            position INTEGER PRIMARY KEY AUTOINCREMENT,
            record_key BLOB NOT NULL UNIQUE,    -- 32 bytes
            data_hash BLOB NOT NULL,            -- 32 bytes, keccak256
            mirrored_at INTEGER NOT NULL        -- local time (Unix ms)
        );
        "#,
    )?;

    Ok(())
}

/// Migration v2: mirror run bookkeeping.
fn apply_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE mirror_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,               -- backend name of the reader
            entries INTEGER NOT NULL,
            inserted INTEGER NOT NULL,
            conflicts INTEGER NOT NULL,
            completed_at INTEGER NOT NULL
        );

        CREATE INDEX idx_mirror_runs_completed ON mirror_runs(completed_at);
        "#,
    )?;

    Ok(())
}

pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"ledger_entries".to_string()));
        assert!(tables.contains(&"mirror_runs".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_upgrade_from_v1() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_migrations (version INTEGER PRIMARY KEY, applied_at INTEGER NOT NULL);
             INSERT INTO schema_migrations VALUES (1, 0);",
        )
        .unwrap();
        apply_v1(&conn).unwrap();

        migrate(&mut conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute("INSERT INTO schema_migrations VALUES (99, 0)", []).unwrap();

        assert!(matches!(migrate(&mut conn), Err(LedgerError::Migration(_))));
    }
}
