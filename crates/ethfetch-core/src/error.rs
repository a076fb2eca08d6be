use std::time::Duration;

use ethers_core::types::H256;

// ==============================================================================
// Boundary Error
// ==============================================================================

/// Error returned across the lookup boundary.
///
/// Input faults pass through as [`CoreError::Codec`] so callers can tell
/// "bad request" apart from system failures. Everything else is collapsed
/// into one of the two coarse kinds; the underlying cause is logged where
/// the collapse happens.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("failed to fetch transaction")]
    FetchFailed,

    #[error("{0}")]
    OperationFailed(&'static str),
}

// ==============================================================================
// Layer Errors
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("invalid hex encoding")]
    InvalidHexEncoding,

    #[error("invalid RLP encoding")]
    InvalidRlpEncoding,

    #[error("invalid transaction hash length")]
    InvalidHashLength,
}

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server error {code}: {message}")]
    ServerError { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    InvalidHash(#[from] CodecError),

    #[error("transaction not found: {0:#x}")]
    TxNotFound(H256),

    #[error("receipt not found for transaction {0:#x}")]
    ReceiptNotFound(H256),

    #[error("ledger fetch did not complete within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    CorruptRow(String),

    #[error("{0} does not fit the column type")]
    OutOfRange(&'static str),
}
