//! # SkillWallet Testkit
//!
//! Testing utilities for SkillWallet verification.
//!
//! - **Golden vectors**: records with their expected encoding length, hash
//!   and record keys, computed independently of this codebase
//! - **Generators**: Proptest strategies for records and raw timestamps
//! - **Fixtures**: Ledgers pre-populated the way each historical writer wrote
//!
//! ## Golden Vectors
//!
//! ```rust
//! use skillwallet_core::{canonical_record_bytes, record_hash};
//! use skillwallet_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     let record = vector.record();
//!     assert_eq!(canonical_record_bytes(&record, vector.reviewed_at).len(), vector.encoding_len);
//!     assert_eq!(record_hash(&record, vector.reviewed_at).to_hex(), vector.record_hash);
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use skillwallet_testkit::fixtures::{sample_record, LedgerFixture};
//!
//! let fixture = LedgerFixture::new();
//! fixture.write_legacy_millis(&sample_record());
//! assert_eq!(fixture.ledger.len(), 1);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{sample_record, FlakyLedger, LedgerFixture};
