//! Shared test helpers for `ethfetch-core` unit tests.
//!
//! Builders for ledger transactions, receipts and persisted records keyed by
//! a single distinguishing byte, so tests across modules share one source of
//! truth for dummy data.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use ethers_core::types::{Address, Bytes, Log, Transaction, TransactionReceipt, H256, U256, U64};
use ethers_core::utils::to_checksum;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::store::{SqliteStore, TransactionStore};
use crate::types::{LedgerPair, RequesterId, TransactionRecord};

// ==============================================================================
// Hash and Address Helpers
// ==============================================================================

/// Create a deterministic `H256` from a single distinguishing byte.
pub fn hash_from_byte(b: u8) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    bytes[31] = 0xee;
    H256::from(bytes)
}

/// Canonical string form of [`hash_from_byte`].
pub fn hash_hex(b: u8) -> String {
    format!("{:#x}", hash_from_byte(b))
}

pub fn address_from_byte(b: u8) -> Address {
    Address::repeat_byte(b)
}

pub fn block_number_for(b: u8) -> u64 {
    1_000 + u64::from(b)
}

// ==============================================================================
// Ledger Builders
// ==============================================================================

/// A mined, unsigned transaction. Sender recovery fails on it, so mapping
/// falls back to the node-reported `from`.
pub fn mined_tx(b: u8) -> Transaction {
    Transaction {
        hash: hash_from_byte(b),
        block_hash: Some(H256::repeat_byte(0xb0)),
        block_number: Some(U64::from(block_number_for(b))),
        from: address_from_byte(0x11),
        to: Some(address_from_byte(0x22)),
        value: U256::from(1_000u64) * U256::from(b),
        input: Bytes::from(vec![0xde, 0xad, b]),
        ..Default::default()
    }
}

/// A transaction the node has seen but not mined yet.
pub fn pending_tx(b: u8) -> Transaction {
    Transaction {
        block_hash: None,
        block_number: None,
        ..mined_tx(b)
    }
}

pub fn receipt_for(b: u8) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: hash_from_byte(b),
        block_hash: Some(H256::repeat_byte(0xb0)),
        block_number: Some(U64::from(block_number_for(b))),
        status: Some(U64::from(1u64)),
        logs: vec![Log::default(), Log::default()],
        contract_address: None,
        ..Default::default()
    }
}

pub fn mined_pair(b: u8) -> LedgerPair {
    LedgerPair {
        transaction: mined_tx(b),
        receipt: receipt_for(b),
    }
}

// ==============================================================================
// Record Builders
// ==============================================================================

pub fn make_record(b: u8) -> TransactionRecord {
    TransactionRecord {
        hash: hash_hex(b),
        status: 1,
        block_hash: format!("{:#x}", H256::repeat_byte(0xb0)),
        block_number: block_number_for(b),
        from_address: to_checksum(&address_from_byte(0x11), None),
        to_address: Some(to_checksum(&address_from_byte(0x22), None)),
        contract_address: None,
        logs_count: 2,
        input: format!("dead{b:02x}"),
        value: (1_000u64 * u64::from(b)).to_string(),
        created_at: OffsetDateTime::from_unix_timestamp(1_700_000_000)
            .expect("static timestamp is in range"),
    }
}

// ==============================================================================
// Counting Store
// ==============================================================================

/// An in-memory SQLite store that counts tier reads and writes and can be
/// switched into failing every write.
pub struct CountingStore {
    inner: SqliteStore,
    by_hash_calls: AtomicUsize,
    save_calls: AtomicUsize,
    fail_writes: AtomicBool,
}

impl CountingStore {
    pub async fn new() -> Self {
        Self {
            inner: SqliteStore::in_memory()
                .await
                .expect("in-memory store must open"),
            by_hash_calls: AtomicUsize::new(0),
            save_calls: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &SqliteStore {
        &self.inner
    }

    pub fn by_hash_calls(&self) -> usize {
        self.by_hash_calls.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Number of stored requester associations.
    pub async fn association_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM user_transactions")
            .fetch_one(self.inner.pool())
            .await
            .expect("association count")
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for CountingStore {
    async fn save(&self, records: &[TransactionRecord]) -> Result<(), StoreError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        self.inner.save(records).await
    }

    async fn add_requester_hashes(
        &self,
        requester: RequesterId,
        hashes: &[String],
    ) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.add_requester_hashes(requester, hashes).await
    }

    async fn by_hashes(&self, hashes: &[String]) -> Result<Vec<TransactionRecord>, StoreError> {
        self.by_hash_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.by_hashes(hashes).await
    }

    async fn for_requester(
        &self,
        requester: RequesterId,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        self.inner.for_requester(requester).await
    }

    async fn all(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        self.inner.all().await
    }
}
