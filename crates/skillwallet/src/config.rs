//! Verifier configuration.

use serde::{Deserialize, Serialize};

/// How candidates are matched against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMode {
    /// By-key lookup when the ledger has an index, otherwise one scan.
    #[default]
    Auto,
    /// Always read one full snapshot and scan it.
    Scan,
}

/// Configuration for the [`IntegrityVerifier`](crate::IntegrityVerifier).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Attach a [`VerificationTrace`](crate::VerificationTrace) to results.
    pub collect_trace: bool,
    /// Ledger matching strategy.
    pub lookup: LookupMode,
}

impl VerifierConfig {
    pub fn with_trace(mut self) -> Self {
        self.collect_trace = true;
        self
    }

    pub fn with_lookup(mut self, lookup: LookupMode) -> Self {
        self.lookup = lookup;
        self
    }
}
