//! # Timestamp Authority Collaborator
//!
//! RFC 3161-style trusted timestamping boundary: given a provisional
//! evidence hash, the authority returns an opaque token attesting the hash
//! existed at a point in time. TSA failure is non-fatal to certification;
//! callers proceed without a token and log a warning.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ves_core::{ContentHash, Timestamp};

/// Failures surfaced by a timestamp authority.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TsaError {
    /// The authority could not be reached or refused the request.
    #[error("timestamp authority unavailable: {message}")]
    Unavailable {
        /// Upstream error detail.
        message: String,
    },
}

/// An issued timestamp token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsaToken {
    /// Opaque token material attesting the stamped hash.
    pub token: String,
    /// When the authority issued the token, UTC.
    pub timestamp: Timestamp,
}

/// A trusted timestamping service.
pub trait TimestampAuthority: Send + Sync {
    /// Request a timestamp token over the given hash.
    fn request_timestamp(
        &self,
        hash: &ContentHash,
    ) -> impl Future<Output = Result<TsaToken, TsaError>> + Send;
}

/// Deterministic in-process timestamp authority.
///
/// Token material derives from the stamped hash, so the same hash always
/// receives the same token. `set_fail` drives the degraded-certification
/// path in tests.
#[derive(Debug, Default)]
pub struct MockTimestampAuthority {
    fail: AtomicBool,
}

impl MockTimestampAuthority {
    /// Create a mock authority.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent requests fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl TimestampAuthority for MockTimestampAuthority {
    async fn request_timestamp(&self, hash: &ContentHash) -> Result<TsaToken, TsaError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TsaError::Unavailable {
                message: "mock timestamp authority set to fail".to_string(),
            });
        }
        Ok(TsaToken {
            token: format!("mock-tsa-{}", hash.as_str()),
            timestamp: Timestamp::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped() -> ContentHash {
        ContentHash::parse(&"cd".repeat(32)).unwrap()
    }

    #[tokio::test]
    async fn token_is_deterministic_per_hash() {
        let tsa = MockTimestampAuthority::new();
        let a = tsa.request_timestamp(&stamped()).await.unwrap();
        let b = tsa.request_timestamp(&stamped()).await.unwrap();
        assert_eq!(a.token, b.token);
        assert!(a.token.starts_with("mock-tsa-"));
        assert!(a.token.ends_with(stamped().as_str()));
    }

    #[tokio::test]
    async fn distinct_hashes_get_distinct_tokens() {
        let tsa = MockTimestampAuthority::new();
        let other = ContentHash::parse(&"ef".repeat(32)).unwrap();
        let a = tsa.request_timestamp(&stamped()).await.unwrap();
        let b = tsa.request_timestamp(&other).await.unwrap();
        assert_ne!(a.token, b.token);
    }

    #[tokio::test]
    async fn fail_switch_produces_unavailable() {
        let tsa = MockTimestampAuthority::new();
        tsa.set_fail(true);
        let err = tsa.request_timestamp(&stamped()).await.unwrap_err();
        assert!(matches!(err, TsaError::Unavailable { .. }));
    }
}
