use std::sync::Arc;
use std::time::Duration;

use ethers_core::types::H256;
use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::codec::to_h256;
use crate::error::FetchError;
use crate::rpc::LedgerRpc;
use crate::types::LedgerPair;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

// ==============================================================================
// Configuration and Results
// ==============================================================================

#[derive(Debug, Clone, Copy)]
pub struct FetcherConfig {
    /// Maximum number of remote calls outstanding at once.
    pub concurrency: usize,
    /// Deadline shared by every fetch in one batch.
    pub deadline: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

/// Outcome of a successful batch: mined pairs, plus the hashes the node
/// reported as not yet mined. Order carries no meaning.
#[derive(Debug, Default)]
pub struct FetchedBatch {
    pub pairs: Vec<LedgerPair>,
    pub pending: Vec<H256>,
}

enum FetchOutcome {
    Mined(LedgerPair),
    Pending(H256),
}

// ==============================================================================
// Ledger Fetcher
// ==============================================================================

/// Fetches transactions and receipts from the ledger node for a batch of
/// hashes.
///
/// Every hash is a concurrent unit of work admitted through a semaphore, so
/// at most `concurrency` remote calls are in flight. The whole batch runs
/// under one deadline; any failure or the deadline expiring fails the batch
/// and drops the outstanding units, so there are never partial results.
pub struct LedgerFetcher {
    rpc: Arc<dyn LedgerRpc>,
    config: FetcherConfig,
}

impl LedgerFetcher {
    pub fn new(rpc: Arc<dyn LedgerRpc>, config: FetcherConfig) -> Self {
        Self {
            rpc,
            config: FetcherConfig {
                concurrency: config.concurrency.max(1),
                ..config
            },
        }
    }

    pub fn config(&self) -> FetcherConfig {
        self.config
    }

    pub async fn fetch_by_hashes(&self, hashes: &[String]) -> Result<FetchedBatch, FetchError> {
        if hashes.is_empty() {
            return Ok(FetchedBatch::default());
        }

        let targets = hashes
            .iter()
            .map(|hash| to_h256(hash))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            count = targets.len(),
            concurrency = self.config.concurrency,
            "fetching transactions from ledger node"
        );

        let semaphore = Semaphore::new(self.config.concurrency);
        let units = targets
            .iter()
            .map(|hash| self.fetch_admitted(&semaphore, *hash));

        let outcomes = tokio::time::timeout(self.config.deadline, try_join_all(units))
            .await
            .map_err(|_| {
                warn!(
                    count = targets.len(),
                    deadline = ?self.config.deadline,
                    "ledger fetch deadline expired"
                );
                FetchError::Timeout(self.config.deadline)
            })??;

        let mut batch = FetchedBatch::default();
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Mined(pair) => batch.pairs.push(pair),
                FetchOutcome::Pending(hash) => batch.pending.push(hash),
            }
        }

        debug!(
            mined = batch.pairs.len(),
            pending = batch.pending.len(),
            "ledger fetch complete"
        );
        Ok(batch)
    }

    async fn fetch_admitted(
        &self,
        semaphore: &Semaphore,
        hash: H256,
    ) -> Result<FetchOutcome, FetchError> {
        let _permit = semaphore
            .acquire()
            .await
            .expect("semaphore is never closed");
        self.fetch_single(hash).await
    }

    /// Fetch the transaction, then its receipt by the transaction's own hash.
    async fn fetch_single(&self, hash: H256) -> Result<FetchOutcome, FetchError> {
        let tx = self
            .rpc
            .get_transaction(hash)
            .await
            .inspect_err(|err| warn!(hash = %format!("{hash:#x}"), error = %err, "transaction fetch failed"))?
            .ok_or(FetchError::TxNotFound(hash))?;

        if tx.block_number.is_none() {
            debug!(hash = %format!("{hash:#x}"), "transaction is still pending");
            return Ok(FetchOutcome::Pending(hash));
        }

        let receipt = self
            .rpc
            .get_receipt(tx.hash)
            .await
            .inspect_err(|err| warn!(hash = %format!("{:#x}", tx.hash), error = %err, "receipt fetch failed"))?
            .ok_or(FetchError::ReceiptNotFound(tx.hash))?;

        Ok(FetchOutcome::Mined(LedgerPair {
            transaction: tx,
            receipt,
        }))
    }
}
