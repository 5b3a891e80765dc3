//! HTTP error mapping for the bridge.
//!
//! Every fault is converted to a complete JSON error body at the handler
//! boundary; nothing escapes to the listener.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use lmbridge_core::UpstreamError;
use thiserror::Error;

use crate::models::ErrorResponse;

/// Seconds a client should wait before retrying a 503.
const RETRY_AFTER_SECS: &str = "5";

/// Request-level failure.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete request.
    #[error("{0}")]
    BadRequest(String),

    /// Request body exceeded the size cap.
    #[error("Request body exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    /// Unknown route or method.
    #[error("Not found")]
    NotFound,

    /// No upstream models are available right now.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Fault raised by the upstream provider.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(err) => StatusCode::from_u16(err.suggested_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            Self::BadRequest(msg) => ErrorResponse::new(msg.clone(), "invalid_request_error"),
            Self::PayloadTooLarge(_) => ErrorResponse::with_code(
                self.to_string(),
                "invalid_request_error",
                "payload_too_large",
            ),
            Self::NotFound => ErrorResponse::not_found(),
            Self::ServiceUnavailable(msg) => ErrorResponse::with_code(
                msg.clone(),
                "service_unavailable",
                "no_models_available",
            ),
            Self::Upstream(UpstreamError::ModelNotFound(model)) => ErrorResponse::with_code(
                format!(
                    "Model '{model}' was not found by the upstream provider. \
                     Request a different model or check GET /v1/models."
                ),
                "invalid_request_error",
                "model_not_found",
            ),
            Self::Upstream(UpstreamError::PermissionDenied(reason)) => ErrorResponse::with_code(
                format!(
                    "The upstream provider denied access: {reason}. \
                     Sign in to the provider and allow the bridge to use its chat models."
                ),
                "permission_error",
                "permission_denied",
            ),
            Self::Upstream(err) => ErrorResponse::new(err.to_string(), "server_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(self.body())).into_response();

        if status == StatusCode::SERVICE_UNAVAILABLE {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from_static(RETRY_AFTER_SECS),
            );
        }

        response
    }
}
