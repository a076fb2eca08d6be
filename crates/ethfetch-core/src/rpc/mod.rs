//! Ledger node RPC abstraction layer.
//!
//! Defines the [`LedgerRpc`] trait and provides an HTTP JSON-RPC
//! implementation ([`HttpRpcClient`]) plus a test mock (`mock::MockLedger`).

mod http_adapter;
#[cfg(test)]
pub mod mock;

pub use http_adapter::HttpRpcClient;

use async_trait::async_trait;
use ethers_core::types::{Transaction, TransactionReceipt, H256};

use crate::error::RpcError;

/// The node methods the lookup pipeline needs.
///
/// Implementations handle authentication, connection management, and
/// response deserialization internally. A single long-lived client is
/// shared by every concurrent fetch.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Fetch a transaction by hash. `None` means the node does not know it.
    /// A returned transaction without a block number is still pending.
    async fn get_transaction(&self, hash: H256) -> Result<Option<Transaction>, RpcError>;

    /// Fetch the receipt of a mined transaction.
    async fn get_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>, RpcError>;

    /// Chain identifier reported by the node.
    async fn chain_id(&self) -> Result<u64, RpcError>;
}
