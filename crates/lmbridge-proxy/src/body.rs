//! Size-capped request body acquisition.

use axum::body::Body;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tracing::warn;

use crate::error::ApiError;

/// Read the whole body, failing as soon as more than `limit` bytes arrive.
///
/// The cap is enforced frame by frame, so an oversized body is rejected
/// before it is fully buffered and before any JSON parsing.
pub(crate) async fn read_limited(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.is::<LengthLimitError>() => {
            warn!(limit, "Request body exceeded size limit");
            Err(ApiError::PayloadTooLarge(limit))
        }
        Err(err) => Err(ApiError::BadRequest(format!(
            "Failed to read request body: {err}"
        ))),
    }
}
