//! # SkillWallet Ledger
//!
//! Read access to the ledger of `(recordKey, dataHash)` pairs written by the
//! approval workflow. The verifier depends only on the [`LedgerReader`]
//! trait; backends are chosen by the caller.
//!
//! ## Key Types
//!
//! - [`LedgerReader`] - The async trait the verifier reads through
//! - [`MemoryLedger`] - Append-only in-memory ledger for tests and fixtures
//! - [`SqliteLedger`] - Local SQLite mirror of a ledger
//! - [`InsertResult`] - Result of appending an entry to the mirror
//!
//! ## Usage
//!
//! ```rust,no_run
//! use skillwallet_ledger::{LedgerReader, MemoryLedger, SqliteLedger};
//!
//! async fn example() {
//!     let chain = MemoryLedger::new();
//!     // chain.push(entry);
//!
//!     // Mirror a snapshot into SQLite and read it back by key
//!     let mirror = SqliteLedger::open("ledger.db").unwrap();
//!     let report = mirror.mirror_from(&chain).await.unwrap();
//!     assert_eq!(report.conflicts, 0);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Ledger order**: entries are returned in the order they were written.
//!   A lookup returns the first entry with the key, same as a scan.
//! - **Append-only mirror**: re-appending an entry returns `AlreadyExists`;
//!   a different hash under a known key returns `Conflict` and the first
//!   write is kept.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{LedgerError, Result};
pub use memory::MemoryLedger;
pub use sqlite::{MirrorReport, SqliteLedger};
pub use traits::{InsertResult, LedgerReader};
