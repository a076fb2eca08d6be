//! Decoding of hex-wrapped RLP payloads into transaction hashes.
//!
//! A payload is the hex form of an RLP value that is either a single
//! string or a list of strings. Each string must be hash-shaped: after an
//! optional `0x` prefix, exactly 40 or 64 hex digits.

use ethers_core::types::H256;
use ethers_core::utils::rlp::{self, Rlp};

use crate::error::CodecError;

const SHORT_HASH_DIGITS: usize = 40;
const LONG_HASH_DIGITS: usize = 64;

// ==============================================================================
// Payload Shapes
// ==============================================================================

/// The two accepted payload shapes, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashPayload {
    SingleHash(String),
    HashList(Vec<String>),
}

impl HashPayload {
    /// Validate every candidate and return the canonical hash set,
    /// preserving list order.
    pub fn into_hashes(self) -> Result<Vec<String>, CodecError> {
        match self {
            Self::SingleHash(candidate) => Ok(vec![validate_hash(&candidate)?]),
            Self::HashList(candidates) => candidates.iter().map(|c| validate_hash(c)).collect(),
        }
    }
}

// ==============================================================================
// Decoding
// ==============================================================================

/// Decode a hex payload into its RLP shape without validating hashes.
///
/// The single-string interpretation is tried first; the list interpretation
/// is only attempted when the single-string decode fails.
pub fn decode_payload(payload: &str) -> Result<HashPayload, CodecError> {
    let bytes = hex::decode(strip_hex_prefix(payload)).map_err(|_| CodecError::InvalidHexEncoding)?;

    // The payload must be exactly one RLP item with nothing after it.
    let item = Rlp::new(&bytes);
    let info = item
        .payload_info()
        .map_err(|_| CodecError::InvalidRlpEncoding)?;
    if info.total() != bytes.len() {
        return Err(CodecError::InvalidRlpEncoding);
    }

    if let Ok(single) = rlp::decode::<String>(&bytes) {
        return Ok(HashPayload::SingleHash(single));
    }

    item.as_list::<String>()
        .map(HashPayload::HashList)
        .map_err(|_| CodecError::InvalidRlpEncoding)
}

/// Decode and validate a hex payload into canonical `0x`-prefixed hashes.
pub fn decode_hashes(payload: &str) -> Result<Vec<String>, CodecError> {
    decode_payload(payload)?.into_hashes()
}

// ==============================================================================
// Hash Shape
// ==============================================================================

/// Check that `candidate` is hash-shaped and return its canonical form:
/// lower-case, `0x`-prefixed.
///
/// Both 20-byte and 32-byte lengths are accepted.
pub fn validate_hash(candidate: &str) -> Result<String, CodecError> {
    let digits = strip_hex_prefix(candidate);
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CodecError::InvalidHexEncoding);
    }
    if digits.len() != SHORT_HASH_DIGITS && digits.len() != LONG_HASH_DIGITS {
        return Err(CodecError::InvalidHashLength);
    }
    Ok(format!("0x{}", digits.to_ascii_lowercase()))
}

/// Convert a hash-shaped string into the 32-byte form the node expects.
/// Shorter values are left-padded with zeros.
pub fn to_h256(hash: &str) -> Result<H256, CodecError> {
    let bytes = hex::decode(strip_hex_prefix(hash)).map_err(|_| CodecError::InvalidHexEncoding)?;
    if bytes.len() > H256::len_bytes() {
        return Err(CodecError::InvalidHashLength);
    }
    let mut padded = [0u8; 32];
    padded[H256::len_bytes() - bytes.len()..].copy_from_slice(&bytes);
    Ok(H256::from(padded))
}

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}
