//! # SkillWallet RPC
//!
//! [`LedgerReader`](skillwallet_ledger::LedgerReader) over Ethereum JSON-RPC.
//! Reads the whole ledger with one `eth_call` of the contract's
//! `getAllSkills()` and decodes the `(bytes32[] keys, bytes32[] hashes)`
//! return value.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use skillwallet_ledger::LedgerReader;
//! use skillwallet_rpc::{RpcConfig, RpcLedger};
//!
//! async fn example() {
//!     let config = RpcConfig::from_env().unwrap();
//!     let ledger = RpcLedger::connect(config).unwrap();
//!     let entries = ledger.entries().await.unwrap();
//!     println!("{} entries", entries.len());
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod messages;

pub use client::RpcLedger;
pub use config::{ContractAddress, RpcConfig};
pub use error::{Result, RpcError};
