//! # SkillWallet Core
//!
//! Pure primitives for verifying approved skill records against the
//! SkillWallet ledger: record model, timestamp normalization, the contract's
//! ABI encoding, Keccak-256 hashing and record-key derivation.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`SkillRecord`] - A reviewed skill event as held by the document store
//! - [`RawTimestamp`] - The ambiguous `reviewedAt` value, in any historical form
//! - [`Keccak256Hash`] - Content hash of a canonical record encoding
//! - [`RecordKey`] - Ledger lookup key for a review event
//! - [`RecordKeyDeriver`] - Ordered candidate keys, one per timestamp variant
//!
//! ## Encoding
//!
//! Records are encoded with the Solidity ABI, field order fixed by the
//! `recordSkill` contract function. See [`canonical`] and [`abi`].

pub mod abi;
pub mod canonical;
pub mod crypto;
pub mod error;
pub mod key;
pub mod record;
pub mod timestamp;
pub mod types;
pub mod validation;

pub use abi::Token;
pub use canonical::{canonical_record_bytes, record_hash, record_key_preimage, record_skill_calldata};
pub use crypto::Keccak256Hash;
pub use error::{CoreError, ValidationError};
pub use key::{derive_record_key, CandidateKey, KeyStrategy, RecordKeyDeriver};
pub use record::{Level, SkillRecord, SkillRecordBuilder};
pub use timestamp::{normalize, NormalizedTimestamp, RawTimestamp, TimestampSource};
pub use types::{LedgerEntry, RecordKey};
pub use validation::{parse_document, validate_record};
