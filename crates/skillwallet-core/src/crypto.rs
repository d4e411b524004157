//! Keccak-256 hashing.
//!
//! The ledger contract hashes with Keccak-256 (the pre-standard SHA-3 padding
//! used by the EVM), so every digest in this workspace goes through here.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;

use crate::error::CoreError;

/// A 32-byte Keccak-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Keccak256Hash(pub [u8; 32]);

impl Keccak256Hash {
    /// Compute the Keccak-256 digest of the given data.
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, no `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Lowercase hex with the `0x` prefix used on the wire.
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// First 16 hex characters, for display only.
    pub fn short(&self) -> String {
        self.to_hex()[..16].to_string()
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        parse_hex32(s).map(Self)
    }

    /// The zero hash (sentinel value).
    pub const ZERO: Self = Self([0u8; 32]);
}

/// Parse a 32-byte value from hex, accepting an optional `0x` prefix.
pub(crate) fn parse_hex32(s: &str) -> Result<[u8; 32], CoreError> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let bytes = hex::decode(s)?;
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CoreError::InvalidLength { expected: 32, got })
}

impl fmt::Debug for Keccak256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keccak256({})", self.short())
    }
}

impl fmt::Display for Keccak256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Keccak256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Keccak256Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Keccak256Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Keccak256Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
