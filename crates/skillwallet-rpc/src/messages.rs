//! JSON-RPC message types and `getAllSkills()` payload handling.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use skillwallet_core::abi::{decode_bytes32_array_pair, function_selector};
use skillwallet_core::canonical::GET_ALL_SKILLS_SIGNATURE;
use skillwallet_core::{Keccak256Hash, LedgerEntry, RecordKey};

use crate::config::ContractAddress;
use crate::error::{Result, RpcError};

pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }

    /// `eth_call` against `to` with raw calldata.
    pub fn eth_call(id: u64, to: &ContractAddress, data: &[u8], block: &str) -> Self {
        Self::new(
            id,
            "eth_call",
            json!([
                {
                    "to": to.to_prefixed_hex(),
                    "data": format!("0x{}", hex::encode(data)),
                },
                block
            ]),
        )
    }
}

/// The error member of a failed response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    /// The result member, or the node's error.
    pub fn into_result(self) -> Result<Value> {
        if let Some(error) = self.error {
            let message = match error.data {
                Some(Value::String(data)) => format!("{} ({})", error.message, data),
                _ => error.message,
            };
            return Err(RpcError::JsonRpc {
                code: error.code,
                message,
            });
        }
        self.result
            .ok_or_else(|| RpcError::InvalidResponse("response has neither result nor error".into()))
    }
}

/// Calldata for `getAllSkills()`: the bare selector.
pub fn get_all_skills_calldata() -> Vec<u8> {
    function_selector(GET_ALL_SKILLS_SIGNATURE).to_vec()
}

/// Decode a `0x`-prefixed hex data string.
pub fn decode_hex_data(value: &Value) -> Result<Vec<u8>> {
    let s = value
        .as_str()
        .ok_or_else(|| RpcError::InvalidResponse(format!("expected hex string, got {}", value)))?;
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::InvalidResponse(format!("hex data missing 0x prefix: {}", s)))?;
    hex::decode(digits).map_err(|e| RpcError::InvalidResponse(format!("hex data: {}", e)))
}

/// Decode the return data of `getAllSkills()` into entries in ledger order.
///
/// Empty return data means the call hit an address with no code.
pub fn decode_get_all_skills(data: &[u8]) -> Result<Vec<LedgerEntry>> {
    if data.is_empty() {
        return Err(RpcError::InvalidResponse(
            "empty return data from getAllSkills(); is the contract deployed at this address?".into(),
        ));
    }
    let (keys, hashes) = decode_bytes32_array_pair(data)?;
    Ok(keys
        .into_iter()
        .zip(hashes)
        .map(|(key, hash)| LedgerEntry::new(RecordKey::from_bytes(key), Keccak256Hash::from_bytes(hash)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillwallet_core::abi::{encode, Token};

    #[test]
    fn test_eth_call_shape() {
        let to = ContractAddress([0x11; 20]);
        let request = JsonRpcRequest::eth_call(7, &to, &get_all_skills_calldata(), "latest");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 7);
        assert_eq!(json["method"], "eth_call");
        assert_eq!(json["params"][0]["to"], format!("0x{}", "11".repeat(20)));
        assert_eq!(json["params"][0]["data"], "0xccc3bba8");
        assert_eq!(json["params"][1], "latest");
    }

    #[test]
    fn test_error_response() {
        let response: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "execution reverted", "data": "0x" }
        }))
        .unwrap();
        match response.into_result() {
            Err(RpcError::JsonRpc { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "execution reverted (0x)");
            }
            other => panic!("expected json-rpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_get_all_skills() {
        let data = encode(&[
            Token::FixedBytes32Array(vec![[0x01; 32], [0x02; 32]]),
            Token::FixedBytes32Array(vec![[0xa1; 32], [0xa2; 32]]),
        ]);
        let hex_value = Value::String(format!("0x{}", hex::encode(&data)));

        let entries = decode_get_all_skills(&decode_hex_data(&hex_value).unwrap()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].record_key, RecordKey::from_bytes([0x01; 32]));
        assert_eq!(entries[1].data_hash, Keccak256Hash::from_bytes([0xa2; 32]));
    }

    #[test]
    fn test_decode_empty_ledger() {
        let data = encode(&[Token::FixedBytes32Array(vec![]), Token::FixedBytes32Array(vec![])]);
        assert!(decode_get_all_skills(&data).unwrap().is_empty());
    }

    #[test]
    fn test_no_code_at_address() {
        let empty = decode_hex_data(&json!("0x")).unwrap();
        assert!(matches!(decode_get_all_skills(&empty), Err(RpcError::InvalidResponse(_))));
    }

    #[test]
    fn test_bad_hex_data() {
        assert!(decode_hex_data(&json!("ccc3")).is_err());
        assert!(decode_hex_data(&json!(12)).is_err());
        assert!(decode_hex_data(&json!("0xzz")).is_err());
    }
}
