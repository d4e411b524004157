//! JSON-RPC ledger client.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use skillwallet_core::LedgerEntry;
use skillwallet_ledger::{LedgerError, LedgerReader};

use crate::config::{ContractAddress, RpcConfig};
use crate::error::{Result, RpcError};
use crate::messages::{decode_get_all_skills, decode_hex_data, get_all_skills_calldata, JsonRpcRequest, JsonRpcResponse};

/// Reads the SkillWallet contract over JSON-RPC.
///
/// Open with [`RpcLedger::connect`]; the HTTP client pools connections and
/// is shared by every call. Dropping the ledger closes them.
pub struct RpcLedger {
    http: reqwest::Client,
    config: RpcConfig,
    contract: ContractAddress,
    next_id: AtomicU64,
}

impl RpcLedger {
    /// Build a client for the configured endpoint and contract.
    ///
    /// Performs no I/O; an unreachable endpoint surfaces on the first read.
    pub fn connect(config: RpcConfig) -> Result<Self> {
        let contract = config.require_contract_address()?;
        if config.url.trim().is_empty() {
            return Err(RpcError::Config("rpc url must not be empty".into()));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| RpcError::Config(format!("http client: {}", e)))?;

        debug!(url = %config.url, contract = %contract, "rpc ledger configured");

        Ok(Self {
            http,
            config,
            contract,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    pub fn contract(&self) -> ContractAddress {
        self.contract
    }

    /// Send one JSON-RPC request and return its result member.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.send(JsonRpcRequest::new(id, method, params)).await
    }

    async fn send(&self, request: JsonRpcRequest) -> Result<Value> {
        let response = self
            .http
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(RpcError::Http {
                status: Some(status.as_u16()),
                message,
            });
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
        body.into_result()
    }

    fn transport_error(&self, e: reqwest::Error) -> RpcError {
        if e.is_timeout() {
            RpcError::Timeout(self.config.timeout)
        } else if e.is_connect() {
            RpcError::Connect(e.to_string())
        } else {
            RpcError::Http {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        }
    }

    /// Chain id reported by the node.
    pub async fn chain_id(&self) -> Result<u64> {
        let value = self.call("eth_chainId", json!([])).await?;
        let s = value
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse(format!("chain id: {}", value)))?;
        let digits = s.strip_prefix("0x").unwrap_or(s);
        u64::from_str_radix(digits, 16)
            .map_err(|e| RpcError::InvalidResponse(format!("chain id `{}`: {}", s, e)))
    }

    /// Every `(recordKey, dataHash)` pair, in ledger order.
    #[instrument(skip(self), fields(contract = %self.contract))]
    pub async fn get_all_skills(&self) -> Result<Vec<LedgerEntry>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::eth_call(id, &self.contract, &get_all_skills_calldata(), &self.config.block);
        let result = self.send(request).await?;
        let entries = decode_get_all_skills(&decode_hex_data(&result)?)?;
        debug!(entries = entries.len(), "ledger snapshot fetched");
        Ok(entries)
    }
}

#[async_trait]
impl LedgerReader for RpcLedger {
    async fn entries(&self) -> std::result::Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self.get_all_skills().await?)
    }

    fn backend(&self) -> &'static str {
        "rpc"
    }
}
