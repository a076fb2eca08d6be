use axum::http::HeaderMap;

use ethfetch_core::RequesterId;

use super::error::AppError;

/// Set by the authenticating gateway in front of the service.
pub(super) const REQUESTER_HEADER: &str = "x-requester-id";

/// The requester named by the request headers. A missing header or an id of
/// zero is an anonymous request.
pub(super) fn requester_from_headers(headers: &HeaderMap) -> Result<RequesterId, AppError> {
    let Some(value) = headers.get(REQUESTER_HEADER) else {
        return Ok(RequesterId::ANONYMOUS);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(RequesterId)
        .ok_or_else(|| AppError::BadRequest("invalid X-Requester-Id header".to_string()))
}

pub(super) fn require_requester(headers: &HeaderMap) -> Result<RequesterId, AppError> {
    let requester = requester_from_headers(headers)?;
    if !requester.is_authenticated() {
        return Err(AppError::Unauthorized(
            "missing X-Requester-Id".to_string(),
        ));
    }
    Ok(requester)
}
