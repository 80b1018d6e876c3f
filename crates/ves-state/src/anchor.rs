//! # Anchor Target Collaborator
//!
//! The external-ledger boundary: one async call that commits a batch root
//! and returns the receipt. Real deployments implement [`AnchorTarget`]
//! against their chain infrastructure; [`MockAnchorTarget`] ships in-tree
//! for tests and self-contained deployments.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use ves_core::{ContentDigest, ContentHash, DigestAlgorithm, Timestamp};

/// Failures surfaced by an anchor target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    /// The anchoring wallet cannot pay for the transaction.
    #[error("anchor wallet has insufficient funds")]
    InsufficientFunds,

    /// The ledger RPC refused or dropped the call.
    #[error("anchor rpc error: {message}")]
    Rpc {
        /// Upstream error detail.
        message: String,
    },

    /// The anchor call did not resolve within the configured timeout.
    #[error("anchor call timed out after {secs}s")]
    Timeout {
        /// The timeout that elapsed.
        secs: u64,
    },
}

/// Receipt returned by a successful anchor call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorReceipt {
    /// Ledger transaction carrying the root.
    pub tx_hash: String,
    /// Block the transaction landed in.
    pub block_number: u64,
    /// Ledger network name.
    pub network: String,
    /// When the anchor was confirmed, UTC.
    pub anchored_at: Timestamp,
    /// Address of the anchoring wallet.
    pub wallet_address: String,
}

/// An external ledger that can commit one batch root per call.
pub trait AnchorTarget: Send + Sync {
    /// Submit `root` for anchoring under the human-readable `batch_key`.
    fn anchor(
        &self,
        root: &ContentHash,
        batch_key: &str,
    ) -> impl Future<Output = Result<AnchorReceipt, AnchorError>> + Send;
}

/// Deterministic in-process anchor target.
///
/// Transaction ids derive from the submitted root and batch key, so a
/// given batch always receives the same id. Block numbers come from an
/// atomic counter. `set_fail` and `set_delay_secs` drive the failure and
/// timeout paths in tests.
#[derive(Debug)]
pub struct MockAnchorTarget {
    network: String,
    wallet_address: String,
    next_block: AtomicU64,
    fail: AtomicBool,
    delay_secs: AtomicU64,
}

impl MockAnchorTarget {
    /// Create a mock target for the given network name.
    pub fn new(network: impl Into<String>) -> Self {
        let network = network.into();
        let wallet_address = format!("0x{}", &raw_sha256_hex(network.as_bytes())[..40]);
        Self {
            network,
            wallet_address,
            next_block: AtomicU64::new(1),
            fail: AtomicBool::new(false),
            delay_secs: AtomicU64::new(0),
        }
    }

    /// Make subsequent anchor calls fail with an RPC error.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Delay subsequent anchor calls by `secs` before responding.
    pub fn set_delay_secs(&self, secs: u64) {
        self.delay_secs.store(secs, Ordering::SeqCst);
    }

    /// The wallet address this target reports in receipts.
    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }
}

impl AnchorTarget for MockAnchorTarget {
    async fn anchor(
        &self,
        root: &ContentHash,
        batch_key: &str,
    ) -> Result<AnchorReceipt, AnchorError> {
        let delay = self.delay_secs.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_secs(delay)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(AnchorError::Rpc {
                message: "mock anchor target set to fail".to_string(),
            });
        }

        let mut hasher = Sha256::new();
        hasher.update(root.as_str().as_bytes());
        hasher.update(batch_key.as_bytes());
        let bytes: [u8; 32] = hasher.finalize().into();
        // Synthetic transaction id, not an evidence digest; the
        // canonical-bytes rule covers evidence and custody hashing only.
        let digest = ContentDigest {
            algorithm: DigestAlgorithm::Sha256,
            bytes,
        };
        let tx_hash = format!("mock-tx-{}", &digest.to_hex()[..16]);

        Ok(AnchorReceipt {
            tx_hash,
            block_number: self.next_block.fetch_add(1, Ordering::SeqCst),
            network: self.network.clone(),
            anchored_at: Timestamp::now(),
            wallet_address: self.wallet_address.clone(),
        })
    }
}

/// Lowercase hex SHA-256 over raw bytes, for synthetic identifiers.
fn raw_sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
