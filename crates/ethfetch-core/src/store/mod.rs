//! Persistent transaction store.
//!
//! Records are immutable once written: saves are insert-if-absent on the
//! transaction hash, and requester associations are unique per
//! `(requester, hash)` pair.

mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{RequesterId, TransactionRecord};

pub use sqlite::SqliteStore;

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persist records as one all-or-nothing batch. Hashes already stored
    /// are left untouched.
    async fn save(&self, records: &[TransactionRecord]) -> Result<(), StoreError>;

    /// Record that `requester` asked for `hashes`. Existing associations
    /// are kept as they are.
    async fn add_requester_hashes(
        &self,
        requester: RequesterId,
        hashes: &[String],
    ) -> Result<(), StoreError>;

    async fn by_hashes(&self, hashes: &[String]) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Stored records this requester has asked for at least once.
    async fn for_requester(
        &self,
        requester: RequesterId,
    ) -> Result<Vec<TransactionRecord>, StoreError>;

    async fn all(&self) -> Result<Vec<TransactionRecord>, StoreError>;
}
