//! Conversions between ledger, persisted and API transaction shapes.

use ethers_core::types::{Address, Transaction, TransactionReceipt};
use ethers_core::utils::to_checksum;
use time::OffsetDateTime;
use tracing::debug;

use crate::types::{ApiTransaction, LedgerPair, TransactionRecord};

/// Map a mined transaction and its receipt to the persisted record shape.
pub fn to_record(tx: &Transaction, receipt: &TransactionReceipt) -> TransactionRecord {
    TransactionRecord {
        hash: format!("{:#x}", tx.hash),
        status: receipt.status.map(|s| s.low_u32()).unwrap_or(0),
        block_hash: receipt
            .block_hash
            .map(|h| format!("{h:#x}"))
            .unwrap_or_default(),
        block_number: receipt.block_number.map(|n| n.as_u64()).unwrap_or(0),
        from_address: checksum(sender(tx)),
        to_address: tx.to.map(checksum),
        contract_address: receipt
            .contract_address
            .filter(|addr| !addr.is_zero())
            .map(checksum),
        logs_count: saturating_count(receipt.logs.len()),
        input: hex::encode(&tx.input),
        value: tx.value.to_string(),
        created_at: OffsetDateTime::now_utc(),
    }
}

pub fn to_records(pairs: &[LedgerPair]) -> Vec<TransactionRecord> {
    pairs
        .iter()
        .map(|pair| to_record(&pair.transaction, &pair.receipt))
        .collect()
}

pub fn to_api(record: &TransactionRecord) -> ApiTransaction {
    ApiTransaction {
        transaction_hash: record.hash.clone(),
        transaction_status: record.status,
        block_hash: record.block_hash.clone(),
        block_number: record.block_number,
        from: record.from_address.clone(),
        to: record.to_address.clone(),
        contract_address: record.contract_address.clone(),
        logs_count: record.logs_count,
        input: record.input.clone(),
        value: record.value.clone(),
    }
}

pub fn to_api_many<'a>(records: impl IntoIterator<Item = &'a TransactionRecord>) -> Vec<ApiTransaction> {
    records.into_iter().map(to_api).collect()
}

/// Resolve the sender from the signature and the chain id it was signed for.
/// Falls back to the node-reported sender when recovery is not possible.
fn sender(tx: &Transaction) -> Address {
    match tx.recover_from() {
        Ok(address) => address,
        Err(err) => {
            debug!(hash = %format!("{:#x}", tx.hash), error = %err, "sender recovery failed; using reported sender");
            tx.from
        }
    }
}

fn saturating_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn checksum(address: Address) -> String {
    to_checksum(&address, None)
}
