//! Error types for SkillWallet Core.

use thiserror::Error;

/// Errors from encoding, decoding and parsing primitive values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// A skill record that does not have the shape the encoding contract needs.
///
/// Raised before any encoding or ledger access takes place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("record document is not an object")]
    NotAnObject,

    #[error("field `{field}` must be {expected}, found {found}")]
    FieldType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("hardSkillNames has {names} entries but hardSkillScores has {scores}")]
    LengthMismatch { names: usize, scores: usize },

    #[error("hardSkillNames[{index}] must be a string, found {found}")]
    SkillName { index: usize, found: &'static str },

    #[error("hardSkillScores[{index}] is not a valid score: {reason}")]
    InvalidScore { index: usize, reason: String },
}

impl From<hex::FromHexError> for CoreError {
    fn from(e: hex::FromHexError) -> Self {
        CoreError::InvalidHex(e.to_string())
    }
}
