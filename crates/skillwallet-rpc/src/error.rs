//! Error types for the RPC ledger.

use std::time::Duration;

use skillwallet_core::CoreError;
use skillwallet_ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur talking to the JSON-RPC endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Missing or invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The endpoint could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success HTTP status or transport failure.
    #[error("http error (status {status:?}): {message}")]
    Http { status: Option<u16>, message: String },

    /// The node returned a JSON-RPC error object.
    #[error("json-rpc error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    /// The response was not a well-formed JSON-RPC result.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The return data could not be ABI-decoded.
    #[error("decoding error: {0}")]
    Decode(#[from] CoreError),

    /// Reading a deployment file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RpcError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Connect(_) | RpcError::Timeout(_) => true,
            RpcError::Http { status, .. } => match status {
                None => true,
                Some(code) => *code == 429 || *code >= 500,
            },
            _ => false,
        }
    }
}

impl From<RpcError> for LedgerError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Timeout(after) => LedgerError::Timeout(after),
            RpcError::Decode(inner) => LedgerError::Decode(inner),
            RpcError::Io(inner) => LedgerError::Io(inner),
            other if other.is_transient() => LedgerError::Unavailable(other.to_string()),
            other => LedgerError::InvalidData(other.to_string()),
        }
    }
}

/// Result type for RPC operations.
pub type Result<T> = std::result::Result<T, RpcError>;
