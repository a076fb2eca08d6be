use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::cache::ResultCache;
use crate::codec;
use crate::error::{CodecError, CoreError};
use crate::fetcher::LedgerFetcher;
use crate::mapper;
use crate::store::TransactionStore;
use crate::types::{ApiTransaction, LookupResult, RequesterId};

/// Resolves transaction hashes through the cache, the persistent store and
/// finally the ledger node, back-filling the cheaper tiers on the way out.
///
/// A lookup either returns every requested transaction or fails: the
/// ledger tier is all-or-nothing, and hits from the cheaper tiers are never
/// surfaced on their own when the ledger tier fails.
pub struct LookupService {
    store: Arc<dyn TransactionStore>,
    cache: Arc<ResultCache>,
    fetcher: LedgerFetcher,
}

impl LookupService {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        cache: Arc<ResultCache>,
        fetcher: LedgerFetcher,
    ) -> Self {
        Self {
            store,
            cache,
            fetcher,
        }
    }

    /// Look up `hashes`, recording them against `requester` when the
    /// requester is authenticated.
    pub async fn by_hashes(
        &self,
        hashes: &[String],
        requester: RequesterId,
    ) -> Result<Vec<ApiTransaction>, CoreError> {
        let hashes = canonicalize(hashes)?;
        info!(count = hashes.len(), requester = %requester, "looking up transactions");

        if requester.is_authenticated() {
            self.store
                .add_requester_hashes(requester, &hashes)
                .await
                .map_err(|err| {
                    error!(requester = %requester, error = %err, "failed to record requested hashes");
                    CoreError::OperationFailed("failed to record requested transactions")
                })?;
        }

        // Tier 1: cache.
        let cached = self.cache.get_many(&hashes).await;
        if cached.is_complete() {
            debug!(hits = cached.found.len(), "served entirely from cache");
            return Ok(mapper::to_api_many(&cached.found));
        }

        // Tier 2: persistent store.
        let stored = self.store.by_hashes(&cached.missing).await.map_err(|err| {
            error!(error = %err, "failed to read transactions from store");
            CoreError::OperationFailed("failed to load transactions")
        })?;
        let stored = LookupResult::partition(&cached.missing, stored);
        if !stored.found.is_empty() {
            self.cache.set_many(&stored.found).await;
        }
        if stored.is_complete() {
            debug!(
                cache_hits = cached.found.len(),
                store_hits = stored.found.len(),
                "served from cache and store"
            );
            return Ok(mapper::to_api_many(
                cached.found.iter().chain(&stored.found),
            ));
        }

        // Tier 3: ledger node.
        let batch = self
            .fetcher
            .fetch_by_hashes(&stored.missing)
            .await
            .map_err(|err| {
                error!(count = stored.missing.len(), error = %err, "ledger fetch failed");
                CoreError::FetchFailed
            })?;

        if !batch.pending.is_empty() {
            let pending: Vec<String> = batch.pending.iter().map(|h| format!("{h:#x}")).collect();
            warn!(?pending, "skipping transactions that are not mined yet");
        }
        if batch.pairs.is_empty() {
            error!(
                count = stored.missing.len(),
                "ledger fetch returned no mined transactions"
            );
            return Err(CoreError::FetchFailed);
        }

        let fetched = mapper::to_records(&batch.pairs);
        self.store.save(&fetched).await.map_err(|err| {
            error!(count = fetched.len(), error = %err, "failed to save fetched transactions");
            CoreError::OperationFailed("failed to save transactions")
        })?;
        self.cache.set_many(&fetched).await;

        info!(
            cache_hits = cached.found.len(),
            store_hits = stored.found.len(),
            fetched = fetched.len(),
            "lookup complete"
        );
        Ok(mapper::to_api_many(
            cached.found.iter().chain(&stored.found).chain(&fetched),
        ))
    }

    /// Decode a hex-wrapped RLP payload and look up the hashes it carries.
    pub async fn from_encoded_payload(
        &self,
        payload: &str,
        requester: RequesterId,
    ) -> Result<Vec<ApiTransaction>, CoreError> {
        let hashes = codec::decode_hashes(payload).inspect_err(|err| {
            debug!(error = %err, "rejected encoded hash payload");
        })?;
        self.by_hashes(&hashes, requester).await
    }

    /// Every stored transaction. Reads the store directly.
    pub async fn all(&self) -> Result<Vec<ApiTransaction>, CoreError> {
        let records = self.store.all().await.map_err(|err| {
            error!(error = %err, "failed to list transactions");
            CoreError::OperationFailed("failed to load transactions")
        })?;
        Ok(mapper::to_api_many(&records))
    }

    /// Stored transactions this requester has asked for. Reads the store
    /// directly.
    pub async fn for_requester(
        &self,
        requester: RequesterId,
    ) -> Result<Vec<ApiTransaction>, CoreError> {
        let records = self.store.for_requester(requester).await.map_err(|err| {
            error!(requester = %requester, error = %err, "failed to list requester transactions");
            CoreError::OperationFailed("failed to load transactions")
        })?;
        Ok(mapper::to_api_many(&records))
    }
}

/// Validate, lower-case and de-duplicate requested hashes, keeping the
/// first occurrence of each.
fn canonicalize(hashes: &[String]) -> Result<Vec<String>, CodecError> {
    if hashes.is_empty() {
        return Err(CodecError::InvalidHashLength);
    }
    let mut seen = HashSet::with_capacity(hashes.len());
    let mut canonical = Vec::with_capacity(hashes.len());
    for candidate in hashes {
        let hash = codec::validate_hash(candidate)?;
        if seen.insert(hash.clone()) {
            canonical.push(hash);
        }
    }
    Ok(canonical)
}
