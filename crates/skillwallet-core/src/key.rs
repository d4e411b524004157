//! Record key derivation.
//!
//! A key is `keccak256(abi.encodePacked(customUid, courseCode, uint256(t)))`.
//! Writers disagreed over `t` in the past, so verification derives one
//! candidate per known variant and tries them in priority order.

use std::fmt;
use std::sync::Arc;

use crate::canonical::record_key_preimage;
use crate::crypto::Keccak256Hash;
use crate::types::RecordKey;

pub const CANONICAL: &str = "canonical";
pub const LEGACY_MILLIS: &str = "ms";
pub const ZERO: &str = "zero";

/// Derive the key for one timestamp component.
pub fn derive_record_key(custom_uid: &str, course_code: &str, t: u128) -> RecordKey {
    RecordKey::from(Keccak256Hash::digest(&record_key_preimage(custom_uid, course_code, t)))
}

/// One way a historical writer chose the key's timestamp component.
pub trait KeyStrategy: Send + Sync {
    /// Short label reported as the matched variant.
    fn label(&self) -> &'static str;

    /// The `t` this variant uses, given the normalized review time.
    fn timestamp_component(&self, reviewed_at_seconds: u64) -> u128;
}

/// `t` = normalized seconds. What the current writer does.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalSeconds;

impl KeyStrategy for CanonicalSeconds {
    fn label(&self) -> &'static str {
        CANONICAL
    }

    fn timestamp_component(&self, reviewed_at_seconds: u64) -> u128 {
        u128::from(reviewed_at_seconds)
    }
}

/// `t` = seconds * 1000. Writers that keyed on the raw millisecond clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyMillis;

impl KeyStrategy for LegacyMillis {
    fn label(&self) -> &'static str {
        LEGACY_MILLIS
    }

    fn timestamp_component(&self, reviewed_at_seconds: u64) -> u128 {
        u128::from(reviewed_at_seconds) * 1000
    }
}

/// `t` = 0. Writers that ran before the review time was set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroTimestamp;

impl KeyStrategy for ZeroTimestamp {
    fn label(&self) -> &'static str {
        ZERO
    }

    fn timestamp_component(&self, _reviewed_at_seconds: u64) -> u128 {
        0
    }
}

/// A derived key and the variant that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateKey {
    pub variant: &'static str,
    pub timestamp: u128,
    pub key: RecordKey,
}

/// Ordered list of key strategies.
#[derive(Clone)]
pub struct RecordKeyDeriver {
    strategies: Vec<Arc<dyn KeyStrategy>>,
}

impl Default for RecordKeyDeriver {
    fn default() -> Self {
        Self {
            strategies: vec![
                Arc::new(CanonicalSeconds),
                Arc::new(LegacyMillis),
                Arc::new(ZeroTimestamp),
            ],
        }
    }
}

impl fmt::Debug for RecordKeyDeriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.label()))
            .finish()
    }
}

impl RecordKeyDeriver {
    /// A deriver with no strategies.
    pub fn empty() -> Self {
        Self { strategies: Vec::new() }
    }

    /// Append a strategy at the lowest priority.
    pub fn push(&mut self, strategy: impl KeyStrategy + 'static) {
        self.strategies.push(Arc::new(strategy));
    }

    pub fn with_strategy(mut self, strategy: impl KeyStrategy + 'static) -> Self {
        self.push(strategy);
        self
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.label()).collect()
    }

    /// Candidates in priority order. A key already produced by a
    /// higher-priority strategy is not repeated.
    pub fn derive(&self, custom_uid: &str, course_code: &str, reviewed_at_seconds: u64) -> Vec<CandidateKey> {
        let mut out: Vec<CandidateKey> = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let timestamp = strategy.timestamp_component(reviewed_at_seconds);
            let key = derive_record_key(custom_uid, course_code, timestamp);
            if out.iter().any(|c| c.key == key) {
                continue;
            }
            out.push(CandidateKey {
                variant: strategy.label(),
                timestamp,
                key,
            });
        }
        out
    }
}
