use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use ethfetch_core::ApiTransaction;

use super::error::{map_core_error, AppError};
use super::requester::{require_requester, requester_from_headers};
use super::SharedState;

const HASHES_PARAM: &str = "transactionHashes";

// ==============================================================================
// DTOs
// ==============================================================================

#[derive(Serialize)]
pub(super) struct TransactionsResponse {
    transactions: Vec<ApiTransaction>,
}

impl From<Vec<ApiTransaction>> for TransactionsResponse {
    fn from(transactions: Vec<ApiTransaction>) -> Self {
        Self { transactions }
    }
}

// ==============================================================================
// Handlers
// ==============================================================================

/// `GET /lime/eth?transactionHashes=<hash>&transactionHashes=<hash>`
pub(super) async fn get_by_hashes(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let requester = requester_from_headers(&headers)?;
    let hashes: Vec<String> = params
        .into_iter()
        .filter(|(key, _)| key == HASHES_PARAM)
        .map(|(_, value)| value)
        .collect();
    if hashes.is_empty() {
        return Err(AppError::BadRequest(format!(
            "'{HASHES_PARAM}' is a required parameter"
        )));
    }

    let transactions = state
        .lookup
        .by_hashes(&hashes, requester)
        .await
        .map_err(map_core_error)?;
    Ok(Json(transactions.into()))
}

/// `GET /lime/eth/{rlphex}`
pub(super) async fn get_by_encoded_payload(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(payload): Path<String>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let requester = requester_from_headers(&headers)?;
    let transactions = state
        .lookup
        .from_encoded_payload(&payload, requester)
        .await
        .map_err(map_core_error)?;
    Ok(Json(transactions.into()))
}

/// `GET /lime/all`
pub(super) async fn get_all(
    State(state): State<SharedState>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let transactions = state.lookup.all().await.map_err(map_core_error)?;
    Ok(Json(transactions.into()))
}

/// `GET /lime/my`
pub(super) async fn get_mine(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<TransactionsResponse>, AppError> {
    let requester = require_requester(&headers)?;
    let transactions = state
        .lookup
        .for_requester(requester)
        .await
        .map_err(map_core_error)?;
    Ok(Json(transactions.into()))
}
