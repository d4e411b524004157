//! RPC ledger configuration.
//!
//! Resolution order: built-in defaults, then environment variables, then the
//! contract address from a `deployment.json` file (written by the contract
//! deploy script) when one is given. CLI flags override all of these.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, RpcError};

pub const ENV_RPC_URL: &str = "SKILLWALLET_RPC_URL";
pub const ENV_CONTRACT_ADDRESS: &str = "SKILLWALLET_CONTRACT_ADDRESS";
pub const ENV_RPC_TIMEOUT_SECS: &str = "SKILLWALLET_RPC_TIMEOUT_SECS";
pub const ENV_DEPLOYMENT_FILE: &str = "SKILLWALLET_DEPLOYMENT_FILE";

/// Local development node.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8550";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A 20-byte contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractAddress(pub [u8; 20]);

impl ContractAddress {
    /// Parse from hex, with or without `0x`. Checksum case is not enforced.
    pub fn from_hex(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|e| RpcError::Config(format!("contract address `{}`: {}", s, e)))?;
        let arr: [u8; 20] = bytes.try_into().map_err(|b: Vec<u8>| {
            RpcError::Config(format!(
                "contract address `{}`: expected 20 bytes, got {}",
                s,
                b.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for ContractAddress {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractAddress({})", self.to_prefixed_hex())
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_prefixed_hex())
    }
}

/// The subset of `deployment.json` the reader needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentInfo {
    contract_address: String,
}

/// Configuration for [`RpcLedger`](crate::RpcLedger).
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// JSON-RPC endpoint.
    pub url: String,

    /// Deployed SkillWallet contract. Required to connect.
    pub contract_address: Option<ContractAddress>,

    /// Whole-request timeout, connect included.
    pub timeout: Duration,

    /// Block tag for `eth_call`.
    pub block: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RPC_URL.to_string(),
            contract_address: None,
            timeout: DEFAULT_TIMEOUT,
            block: "latest".to_string(),
        }
    }
}

impl RpcConfig {
    /// Configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = var(ENV_RPC_URL).filter(|v| !v.trim().is_empty()) {
            config.url = url;
        }

        if let Some(address) = var(ENV_CONTRACT_ADDRESS).filter(|v| !v.trim().is_empty()) {
            config.contract_address = Some(ContractAddress::from_hex(&address)?);
        }

        if let Some(secs) = var(ENV_RPC_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                RpcError::Config(format!("{} must be a whole number of seconds, got `{}`", ENV_RPC_TIMEOUT_SECS, secs))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(path) = var(ENV_DEPLOYMENT_FILE).filter(|v| !v.trim().is_empty()) {
            config = config.with_deployment_file(PathBuf::from(path))?;
        }

        Ok(config)
    }

    /// Take the contract address from a `deployment.json` file.
    pub fn with_deployment_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.contract_address = Some(load_deployment(path.as_ref())?);
        Ok(self)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_contract_address(mut self, address: ContractAddress) -> Self {
        self.contract_address = Some(address);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The contract address, or a configuration error naming how to set it.
    pub fn require_contract_address(&self) -> Result<ContractAddress> {
        self.contract_address.ok_or_else(|| {
            RpcError::Config(format!(
                "no contract address: set {} or {}",
                ENV_CONTRACT_ADDRESS, ENV_DEPLOYMENT_FILE
            ))
        })
    }
}

/// Read the contract address from a `deployment.json` file.
pub fn load_deployment(path: &Path) -> Result<ContractAddress> {
    let raw = std::fs::read_to_string(path)?;
    let info: DeploymentInfo = serde_json::from_str(&raw)
        .map_err(|e| RpcError::Config(format!("{}: {}", path.display(), e)))?;
    ContractAddress::from_hex(&info.contract_address)
}
