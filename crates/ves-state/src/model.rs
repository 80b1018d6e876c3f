//! # Persisted Record Types
//!
//! The two record shapes the stores hold: one evidence record per
//! certification, one batch record per anchoring run. Both are
//! append-mostly; the only permitted mutations are the one-time batch
//! assignment on evidence records and the pending-to-terminal status
//! transition on batch records.

use serde::{Deserialize, Serialize};

use ves_core::{BatchId, CertificationId, ContentHash, Timestamp};
use ves_evidence::CanonicalEvidence;
use ves_merkle::MerkleProof;

/// Validity status of an evidence record.
///
/// Revocation is a soft transition outside of hashing: the evidence hash
/// and custody chain stay intact, the record just stops being eligible
/// for batching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    /// Record is live and eligible for batching.
    Valid,
    /// Record has been revoked by the operator.
    Revoked,
}

impl EvidenceStatus {
    /// Lowercase wire name for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for EvidenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One certified evidence record.
///
/// Created at certification time. `merkle_batch_id` and `merkle_proof`
/// start absent and are set together exactly once when an anchoring run
/// claims the record; the store rejects re-assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// The record's identifier.
    pub id: CertificationId,
    /// Store-assigned insertion sequence. Breaks `created_at` ties
    /// (whole-second resolution) in certification order.
    #[serde(default)]
    pub seq: u64,
    /// The immutable evidence document.
    pub evidence: CanonicalEvidence,
    /// SHA-256 over the canonicalized evidence; the Merkle leaf.
    pub evidence_hash: ContentHash,
    /// Validity status.
    pub status: EvidenceStatus,
    /// Batch that committed this record, once assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merkle_batch_id: Option<BatchId>,
    /// Inclusion proof against the batch root, set with the assignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merkle_proof: Option<MerkleProof>,
    /// Evidence hash of the same creator's previous valid record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_evidence_hash: Option<ContentHash>,
    /// When the record was certified, UTC.
    pub created_at: Timestamp,
}

impl EvidenceRecord {
    /// Whether the record has been claimed by a batch.
    pub fn is_batched(&self) -> bool {
        self.merkle_batch_id.is_some()
    }
}

/// Lifecycle status of a Merkle batch.
///
/// `Pending` is the durable pre-anchor state; a batch transitions once to
/// `Anchored` or `Failed` and is never re-opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Root computed and persisted, anchor call not yet resolved.
    Pending,
    /// Root committed to the external ledger.
    Anchored,
    /// Anchor call failed or timed out.
    Failed,
}

impl BatchStatus {
    /// Lowercase wire name for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Anchored => "anchored",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One anchoring run's batch record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerkleBatch {
    /// The batch identifier.
    pub id: BatchId,
    /// Human-readable run key, `batch-YYYYMMDD-HHMMSS`.
    pub batch_key: String,
    /// Root over the batch's evidence hashes.
    pub merkle_root: ContentHash,
    /// Number of evidence records committed under the root.
    pub certification_count: u64,
    /// Lifecycle status.
    pub status: BatchStatus,
    /// Ledger transaction carrying the root, once anchored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_tx_hash: Option<String>,
    /// Block the anchor transaction landed in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_block_number: Option<u64>,
    /// Ledger network the root was anchored to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_network: Option<String>,
    /// When the anchor was confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchored_at: Option<Timestamp>,
    /// When the batch row was created.
    pub created_at: Timestamp,
}
