//! # SkillWallet
//!
//! Integrity verification for approved skill records. A record held by the
//! document store is re-encoded exactly as the approval workflow encoded it,
//! hashed, and compared against the hash the ledger holds for it.
//!
//! ## Overview
//!
//! - **Normalize** `reviewedAt` to epoch seconds, whatever form it was stored in
//! - **Encode** the record with the contract's ABI field order and hash it
//! - **Derive** candidate record keys, one per historical key variant
//! - **Read** the ledger once and classify the outcome
//!
//! Every call ends in exactly one of three outcomes: verified, not verified
//! (with both hashes for audit), or unavailable (retry later).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use skillwallet::{IntegrityVerifier, VerifierConfig};
//! use skillwallet::rpc::{RpcConfig, RpcLedger};
//!
//! async fn example(doc: serde_json::Value) {
//!     let ledger = RpcLedger::connect(RpcConfig::from_env().unwrap()).unwrap();
//!     let verifier = IntegrityVerifier::new(Arc::new(ledger), VerifierConfig::default());
//!
//!     let result = verifier.verify_document(&doc, "job-42").await.unwrap();
//!     println!("{:?}: {}", result.outcome(), result.message);
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `skillwallet::core` - Record model, normalization, encoding, keys
//! - `skillwallet::ledger` - Ledger reader trait, memory and SQLite backends
//! - `skillwallet::rpc` - JSON-RPC ledger reader

pub mod config;
pub mod error;
pub mod result;
pub mod source;
pub mod trace;
pub mod verifier;

// Re-export component crates
pub use skillwallet_core as core;
pub use skillwallet_ledger as ledger;
pub use skillwallet_rpc as rpc;

// Re-export main types for convenience
pub use config::{LookupMode, VerifierConfig};
pub use error::{Result, SourceError, VerifyError};
pub use result::{ErrorKind, Outcome, VerificationResult};
pub use source::{JsonFileRecordSource, MemoryRecordSource, RecordSource};
pub use trace::{CandidateTrace, LookupStrategy, VerificationTrace};
pub use verifier::IntegrityVerifier;

// Re-export commonly used core types
pub use skillwallet_core::{
    Keccak256Hash, LedgerEntry, Level, RawTimestamp, RecordKey, RecordKeyDeriver, SkillRecord,
    TimestampSource,
};
pub use skillwallet_ledger::{LedgerReader, MemoryLedger, SqliteLedger};
