//! # Chain of Custody — Hash-Linked Lifecycle Events
//!
//! Every evidence record carries an append-only sequence of custody events.
//! Each event's `log_hash` covers the canonical payload
//! `{certification_id, event_type, event_data, previous_log_hash, timestamp}`
//! and links to its predecessor through `previous_log_hash`, so any
//! after-the-fact edit of an event body or any splice of the sequence is
//! detectable by replay.
//!
//! `previous_log_hash` is the one nullable-by-schema field in the stack: the
//! genesis event serializes it as JSON `null`, never omits it. Skipping the
//! key would make the genesis payload hash ambiguous against later events.
//!
//! Event bodies form a closed union keyed by `event_type`; an unknown type
//! fails deserialization, so nothing unenumerated can enter a chain.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ves_core::{
    sha256_digest, BatchId, CanonicalBytes, CanonicalError, CertificationId, ContentHash,
    Timestamp,
};

/// The closed set of custody event bodies.
///
/// Adjacently tagged: the wire form is
/// `{"event_type": "upload_received", "event_data": {...}}`, which is also
/// the shape hashed into `log_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "event_data", rename_all = "snake_case")]
pub enum CustodyEventKind {
    /// Raw upload accepted by the ingest edge.
    UploadReceived {
        /// Client-reported file name.
        file_name: String,
        /// Upload size in bytes.
        size_bytes: u64,
    },
    /// The evidence hash was computed (or recomputed after TSA attach).
    HashComputed {
        /// The hash current at the time of the event.
        evidence_hash: ContentHash,
    },
    /// Frame sampling finished upstream.
    FramesExtracted {
        /// Number of sampled frames.
        frame_count: u64,
    },
    /// Audio track extraction finished upstream.
    AudioExtracted {
        /// Hash of the extracted track.
        audio_hash: ContentHash,
    },
    /// A timestamp was requested from the TSA.
    TimestampRequested {
        /// The provisional evidence hash sent for stamping.
        hash: ContentHash,
    },
    /// The TSA responded with a token.
    TimestampReceived {
        /// SHA-256 over the canonicalized token string.
        token_digest: ContentHash,
    },
    /// The record's batch was anchored to the external ledger.
    AnchoredOnChain {
        /// The batch the record belongs to.
        batch_id: BatchId,
        /// Root committed on chain.
        merkle_root: ContentHash,
        /// Ledger transaction hash.
        tx_hash: String,
    },
    /// A verifiable package was exported for the record.
    CertificateIssued {
        /// Hash of the exported package document.
        package_hash: ContentHash,
    },
}

impl CustodyEventKind {
    /// The wire tag of this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::UploadReceived { .. } => "upload_received",
            Self::HashComputed { .. } => "hash_computed",
            Self::FramesExtracted { .. } => "frames_extracted",
            Self::AudioExtracted { .. } => "audio_extracted",
            Self::TimestampRequested { .. } => "timestamp_requested",
            Self::TimestampReceived { .. } => "timestamp_received",
            Self::AnchoredOnChain { .. } => "anchored_on_chain",
            Self::CertificateIssued { .. } => "certificate_issued",
        }
    }
}

/// One persisted custody event.
///
/// `kind` is flattened, so the stored and exported form carries
/// `event_type`/`event_data` at the top level next to the chain fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyEvent {
    /// The evidence record this event belongs to.
    pub certification_id: CertificationId,
    /// What happened.
    #[serde(flatten)]
    pub kind: CustodyEventKind,
    /// `log_hash` of the preceding event; `null` for the genesis event.
    pub previous_log_hash: Option<ContentHash>,
    /// SHA-256 over the canonical event payload.
    pub log_hash: ContentHash,
    /// When the event was appended, UTC.
    pub timestamp: Timestamp,
}

impl CustodyEvent {
    /// Build an event, computing its `log_hash` from the payload.
    ///
    /// The caller supplies `previous_log_hash` read under the ledger's
    /// per-record append lock; two events of one record must never be
    /// created concurrently.
    pub fn create(
        certification_id: CertificationId,
        kind: CustodyEventKind,
        previous_log_hash: Option<ContentHash>,
        timestamp: Timestamp,
    ) -> Result<Self, CanonicalError> {
        let log_hash = compute_log_hash(
            &certification_id,
            &kind,
            previous_log_hash.as_ref(),
            &timestamp,
        )?;
        Ok(Self {
            certification_id,
            kind,
            previous_log_hash,
            log_hash,
            timestamp,
        })
    }
}

/// The exact payload shape covered by `log_hash`.
///
/// `previous_log_hash` is always present: `None` serializes as `null`.
#[derive(Serialize)]
struct CustodyPayload<'a> {
    certification_id: &'a CertificationId,
    #[serde(flatten)]
    kind: &'a CustodyEventKind,
    previous_log_hash: Option<&'a ContentHash>,
    timestamp: &'a Timestamp,
}

/// Compute the `log_hash` of an event payload.
pub fn compute_log_hash(
    certification_id: &CertificationId,
    kind: &CustodyEventKind,
    previous_log_hash: Option<&ContentHash>,
    timestamp: &Timestamp,
) -> Result<ContentHash, CanonicalError> {
    let payload = CustodyPayload {
        certification_id,
        kind,
        previous_log_hash,
        timestamp,
    };
    let bytes = CanonicalBytes::new(&payload)?;
    Ok(sha256_digest(&bytes).to_content_hash())
}

/// One broken invariant found while replaying a chain.
///
/// Findings, not write-time failures: verification reports, it never
/// repairs.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum ChainViolation {
    /// Recomputed payload hash differs from the stored `log_hash`.
    #[error("event {index}: stored log_hash does not match recomputed payload hash")]
    HashMismatch {
        /// Zero-based event position.
        index: usize,
    },

    /// `previous_log_hash` does not point at the predecessor's `log_hash`.
    #[error("event {index}: previous_log_hash does not match predecessor")]
    BrokenLink {
        /// Zero-based event position.
        index: usize,
    },

    /// The first event carries a non-null `previous_log_hash`.
    #[error("genesis event carries a non-null previous_log_hash")]
    NonNullGenesis,
}

/// Replay a record's events in creation order and report every broken
/// invariant. An empty result means the chain is intact.
///
/// Checks per event: the stored `log_hash` equals the recomputed payload
/// hash; `previous_log_hash` equals the predecessor's `log_hash`; the
/// genesis event links to `null`.
pub fn verify_chain(events: &[CustodyEvent]) -> Vec<ChainViolation> {
    let mut violations = Vec::new();

    for (index, event) in events.iter().enumerate() {
        let recomputed = compute_log_hash(
            &event.certification_id,
            &event.kind,
            event.previous_log_hash.as_ref(),
            &event.timestamp,
        );
        match recomputed {
            Ok(expected) if expected == event.log_hash => {}
            _ => violations.push(ChainViolation::HashMismatch { index }),
        }

        if index == 0 {
            if event.previous_log_hash.is_some() {
                violations.push(ChainViolation::NonNullGenesis);
            }
        } else if event.previous_log_hash.as_ref() != Some(&events[index - 1].log_hash) {
            violations.push(ChainViolation::BrokenLink { index });
        }
    }

    violations
}
