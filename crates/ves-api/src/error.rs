//! # HTTP Error Surface
//!
//! `AppError` is the one error type handlers return. Its `IntoResponse`
//! impl renders the envelope `{"error": {"code", "message", "details?"}}`,
//! picks the status code, and keeps internal fault text out of client
//! responses — operators get it through the log line instead.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use ves_core::CanonicalError;
use ves_evidence::{EvidenceError, PackageError};
use ves_state::{CoordinatorError, StoreError};

/// Envelope every error response is wrapped in.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Payload inside the envelope: a stable machine code, a human message,
/// and optional machine context (only 429 defines any today).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Stable snake_case code clients can switch on.
    pub code: String,
    /// Human-readable description.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Handler-level error with an HTTP rendering.
#[derive(Error, Debug)]
pub enum AppError {
    /// 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// 400 — refused at the validation boundary.
    #[error("validation error: {0}")]
    Validation(String),

    /// 401 — token missing, malformed, or wrong.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 429 — batch admission control refused the run.
    #[error("rate limited: next batch run allowed in {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the next run is admissible.
        retry_after_secs: u64,
    },

    /// 500 — the message goes to the log, never to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            other => tracing::warn!(error = %other, "request failed"),
        }

        // Internal fault text stays server-side.
        let message = if matches!(self, Self::Internal(_)) {
            "an internal error occurred".to_string()
        } else {
            self.to_string()
        };
        let details = match &self {
            Self::RateLimited { retry_after_secs } => {
                Some(serde_json::json!({ "retry_after_seconds": retry_after_secs }))
            }
            _ => None,
        };

        let envelope = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        let mut response = (status, Json(envelope)).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            if let Ok(value) = header::HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Bad evidence input is the client's problem; a document that will not
/// canonicalize after validation passed is ours.
impl From<EvidenceError> for AppError {
    fn from(err: EvidenceError) -> Self {
        match err {
            EvidenceError::Validation { .. } => Self::Validation(err.to_string()),
            EvidenceError::Canonical(_) => Self::Internal(err.to_string()),
        }
    }
}

/// Store contract violations are server faults; read-path misses become
/// 404 at the call site before this impl is reached.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<CanonicalError> for AppError {
    fn from(err: CanonicalError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<PackageError> for AppError {
    fn from(err: PackageError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<CoordinatorError> for AppError {
    fn from(err: CoordinatorError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn classify_covers_every_variant() {
        let table = [
            (
                AppError::NotFound("gone".into()),
                StatusCode::NOT_FOUND,
                "not_found",
            ),
            (
                AppError::Validation("bad field".into()),
                StatusCode::BAD_REQUEST,
                "validation_error",
            ),
            (
                AppError::Unauthorized("no token".into()),
                StatusCode::UNAUTHORIZED,
                "unauthorized",
            ),
            (
                AppError::RateLimited {
                    retry_after_secs: 60,
                },
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
            ),
            (
                AppError::Internal("store poisoned".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];
        for (err, status, code) in table {
            assert_eq!(err.classify(), (status, code), "variant {code}");
        }
    }

    #[test]
    fn evidence_validation_becomes_client_error() {
        let err = AppError::from(EvidenceError::Validation {
            field: "video.file_hash".to_string(),
            reason: "bad length".to_string(),
        });
        assert_eq!(err.classify().0, StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("video.file_hash"));
    }

    #[test]
    fn store_error_becomes_server_fault() {
        let err = AppError::from(StoreError::NotFound {
            id: "cert:x".to_string(),
        });
        assert_eq!(err.classify().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn envelope_omits_absent_details() {
        let envelope = ErrorBody {
            error: ErrorDetail {
                code: "not_found".to_string(),
                message: "gone".to_string(),
                details: None,
            },
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("not_found"));
        assert!(!json.contains("details"));
    }

    async fn rendered(err: AppError) -> (StatusCode, Option<String>, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, retry_after, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn render_not_found_keeps_message() {
        let (status, retry, envelope) = rendered(AppError::NotFound("record 123".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(retry.is_none());
        assert_eq!(envelope.error.code, "not_found");
        assert!(envelope.error.message.contains("record 123"));
        assert!(envelope.error.details.is_none());
    }

    #[tokio::test]
    async fn render_rate_limited_sets_header_and_details() {
        let (status, retry, envelope) = rendered(AppError::RateLimited {
            retry_after_secs: 1800,
        })
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(retry.as_deref(), Some("1800"));
        assert_eq!(envelope.error.code, "rate_limited");
        let details = envelope.error.details.expect("details present");
        assert_eq!(details["retry_after_seconds"], 1800);
    }

    #[tokio::test]
    async fn render_internal_swallows_fault_text() {
        let (status, _, envelope) = rendered(AppError::Internal("lock ordering bug".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope.error.code, "internal_error");
        assert_eq!(envelope.error.message, "an internal error occurred");
        assert!(!envelope.error.message.contains("lock ordering"));
    }
}
