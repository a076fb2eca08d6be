use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ethers_core::types::{Transaction, TransactionReceipt, H256};

use crate::error::RpcError;
use crate::types::LedgerPair;

use super::LedgerRpc;

/// A mock ledger node for testing. Returns canned transactions and receipts
/// populated via the builder pattern, and records how many calls were made
/// and how many were outstanding at once.
pub struct MockLedger {
    transactions: HashMap<H256, Transaction>,
    receipts: HashMap<H256, TransactionReceipt>,
    failing: HashSet<H256>,
    failing_receipts: HashSet<H256>,
    delay: Option<Duration>,
    chain_id: u64,
    transaction_calls: AtomicUsize,
    receipt_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockLedger {
    pub fn builder() -> MockLedgerBuilder {
        MockLedgerBuilder {
            transactions: HashMap::new(),
            receipts: HashMap::new(),
            failing: HashSet::new(),
            failing_receipts: HashSet::new(),
            delay: None,
            chain_id: 1,
        }
    }

    pub fn transaction_calls(&self) -> usize {
        self.transaction_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_calls(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }

    /// Highest number of remote calls observed outstanding at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> InFlightGuard<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlightGuard {
            in_flight: &self.in_flight,
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        guard
    }
}

/// Decrements the in-flight counter even when the call is cancelled.
struct InFlightGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MockLedgerBuilder {
    transactions: HashMap<H256, Transaction>,
    receipts: HashMap<H256, TransactionReceipt>,
    failing: HashSet<H256>,
    failing_receipts: HashSet<H256>,
    delay: Option<Duration>,
    chain_id: u64,
}

impl MockLedgerBuilder {
    pub fn with_pair(mut self, pair: LedgerPair) -> Self {
        let hash = pair.transaction.hash;
        self.transactions.insert(hash, pair.transaction);
        self.receipts.insert(hash, pair.receipt);
        self
    }

    pub fn with_pending(mut self, tx: Transaction) -> Self {
        self.transactions.insert(tx.hash, tx);
        self
    }

    /// Make `eth_getTransactionByHash` fail for `hash`.
    pub fn failing(mut self, hash: H256) -> Self {
        self.failing.insert(hash);
        self
    }

    /// Make `eth_getTransactionReceipt` fail for `hash`.
    pub fn failing_receipt(mut self, hash: H256) -> Self {
        self.failing_receipts.insert(hash);
        self
    }

    /// Hold every call open for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn build(self) -> MockLedger {
        MockLedger {
            transactions: self.transactions,
            receipts: self.receipts,
            failing: self.failing,
            failing_receipts: self.failing_receipts,
            delay: self.delay,
            chain_id: self.chain_id,
            transaction_calls: AtomicUsize::new(0),
            receipt_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn get_transaction(&self, hash: H256) -> Result<Option<Transaction>, RpcError> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = self.enter().await;
        if self.failing.contains(&hash) {
            return Err(RpcError::ServerError {
                code: -32000,
                message: "mock transaction failure".into(),
            });
        }
        Ok(self.transactions.get(&hash).cloned())
    }

    async fn get_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>, RpcError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = self.enter().await;
        if self.failing_receipts.contains(&hash) {
            return Err(RpcError::ServerError {
                code: -32000,
                message: "mock receipt failure".into(),
            });
        }
        Ok(self.receipts.get(&hash).cloned())
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[tokio::test]
    async fn returns_canned_pairs_and_counts_calls() {
        let rpc = MockLedger::builder().with_pair(mined_pair(1)).build();

        let tx = rpc
            .get_transaction(hash_from_byte(1))
            .await
            .expect("mock call must succeed");
        assert_eq!(tx.map(|t| t.hash), Some(hash_from_byte(1)));
        assert!(rpc
            .get_transaction(hash_from_byte(2))
            .await
            .expect("unknown hash is not an error")
            .is_none());
        assert_eq!(rpc.transaction_calls(), 2);
        assert_eq!(rpc.chain_id().await.expect("chain id"), 1);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_server_errors() {
        let rpc = MockLedger::builder()
            .with_pair(mined_pair(1))
            .failing_receipt(hash_from_byte(1))
            .build();

        assert!(rpc.get_transaction(hash_from_byte(1)).await.is_ok());
        let err = rpc
            .get_receipt(hash_from_byte(1))
            .await
            .expect_err("receipt must fail");
        assert!(matches!(err, RpcError::ServerError { .. }));
        assert_eq!(rpc.max_in_flight(), 1);
    }
}
