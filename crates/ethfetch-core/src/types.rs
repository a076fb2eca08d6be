use std::collections::HashSet;
use std::fmt;

use ethers_core::types::{Transaction, TransactionReceipt};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// ==============================================================================
// Requester Identity
// ==============================================================================

/// Identity of the caller asking for transactions.
///
/// Zero is reserved for anonymous callers; associations are only recorded
/// for authenticated (non-zero) requesters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(pub u64);

impl RequesterId {
    pub const ANONYMOUS: RequesterId = RequesterId(0);

    pub fn is_authenticated(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==============================================================================
// Transaction Record (persisted shape)
// ==============================================================================

/// Canonical, persisted form of a mined transaction and its receipt.
///
/// Created once on the first successful ledger fetch and never updated.
/// `value` stays a decimal string because ledger amounts exceed 64 bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub hash: String,
    pub status: u32,
    pub block_hash: String,
    pub block_number: u64,
    pub from_address: String,
    pub to_address: Option<String>,
    pub contract_address: Option<String>,
    pub logs_count: u32,
    pub input: String,
    pub value: String,
    pub created_at: OffsetDateTime,
}

// ==============================================================================
// API Shape
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTransaction {
    pub transaction_hash: String,
    pub transaction_status: u32,
    pub block_hash: String,
    pub block_number: u64,
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contract_address: Option<String>,
    pub logs_count: u32,
    pub input: String,
    pub value: String,
}

// ==============================================================================
// Ledger Pair
// ==============================================================================

/// A mined transaction together with its receipt, as returned by the node.
#[derive(Debug, Clone)]
pub struct LedgerPair {
    pub transaction: Transaction,
    pub receipt: TransactionReceipt,
}

// ==============================================================================
// Lookup Result
// ==============================================================================

/// Partition of a requested hash set against one tier.
///
/// Order inside each collection carries no meaning; only membership does.
#[derive(Debug, Clone, Default)]
pub struct LookupResult {
    pub found: Vec<TransactionRecord>,
    pub found_hashes: Vec<String>,
    pub missing: Vec<String>,
}

impl LookupResult {
    /// Build a partition from the records a tier returned for `requested`.
    /// Records for hashes that were not requested are ignored.
    pub fn partition(requested: &[String], records: Vec<TransactionRecord>) -> Self {
        let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();
        let found: Vec<TransactionRecord> = records
            .into_iter()
            .filter(|record| wanted.contains(record.hash.as_str()))
            .collect();
        let found_set: HashSet<&str> = found.iter().map(|r| r.hash.as_str()).collect();
        let missing = requested
            .iter()
            .filter(|hash| !found_set.contains(hash.as_str()))
            .cloned()
            .collect();
        let found_hashes = found.iter().map(|r| r.hash.clone()).collect();

        Self {
            found,
            found_hashes,
            missing,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}
