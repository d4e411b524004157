//! Strong type definitions for ledger data.
//!
//! Record keys and data hashes are both 32 bytes; newtypes keep them apart.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::crypto::{parse_hex32, Keccak256Hash};
use crate::error::CoreError;

/// A 32-byte ledger record key: `keccak256(customUid || courseCode || uint256(t))`.
///
/// Identifies a logical review event, independent of the record content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey(pub [u8; 32]);

impl RecordKey {
    /// Create a new RecordKey from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Hex with the `0x` prefix.
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// Parse from hex string, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        parse_hex32(s).map(Self)
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordKey({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for RecordKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for RecordKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Keccak256Hash> for RecordKey {
    fn from(hash: Keccak256Hash) -> Self {
        Self(hash.0)
    }
}

impl TryFrom<&[u8]> for RecordKey {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

impl Serialize for RecordKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecordKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// One `(recordKey, dataHash)` pair as written by the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub record_key: RecordKey,
    pub data_hash: Keccak256Hash,
}

impl LedgerEntry {
    pub const fn new(record_key: RecordKey, data_hash: Keccak256Hash) -> Self {
        Self {
            record_key,
            data_hash,
        }
    }
}
