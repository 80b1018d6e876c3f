//! # Canonical Evidence Model
//!
//! The `CanonicalEvidence` document is the unit of certification: once its
//! hash is computed, any field change invalidates that hash. Optional fields
//! that are absent are omitted from serialization (`skip_serializing_if`),
//! never emitted as `null` — the canonicalization pipeline preserves
//! whatever the model emits, so absence discipline lives here.

use serde::{Deserialize, Serialize};

use ves_core::{sha256_digest, CanonicalBytes, CanonicalError, ContentHash, CreatorId, Timestamp};

/// Version tag written into every new evidence document.
pub const EVIDENCE_SCHEMA_VERSION: &str = "1.0";

/// A complete, hashable evidence document.
///
/// The evidence hash is `SHA256(canonicalize(self))`; see
/// [`CanonicalEvidence::compute_hash`]. That hash is the record's Merkle
/// leaf once the record is batched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvidence {
    /// Evidence schema version.
    pub version: String,
    /// Content hashes of the certified video.
    pub video: VideoEvidence,
    /// Who certified the content.
    pub creator: CreatorInfo,
    /// When the content was certified.
    pub timestamps: EvidenceTimestamps,
    /// Declared facts about the content.
    pub metadata: EvidenceMetadata,
}

impl CanonicalEvidence {
    /// Compute the evidence hash over the canonical JSON form.
    ///
    /// Every component that needs this hash (builder, exporter, offline
    /// verifier) calls this one function.
    pub fn compute_hash(&self) -> Result<ContentHash, CanonicalError> {
        let bytes = CanonicalBytes::new(self)?;
        Ok(sha256_digest(&bytes).to_content_hash())
    }

    /// Attach a TSA token and recompute the hash.
    ///
    /// The hash computed before the token existed is provisional (it is the
    /// hash the TSA was asked to stamp); the hash returned here is final
    /// and is the only one that may be used as a Merkle leaf.
    pub fn attach_tsa_token(
        &mut self,
        token: impl Into<String>,
    ) -> Result<ContentHash, CanonicalError> {
        self.timestamps.tsa_token = Some(token.into());
        self.compute_hash()
    }
}

/// Content hashes of the video artifact and its derived tracks.
///
/// All hashes arrive pre-computed from the upstream fingerprinting step;
/// this model treats them as opaque, validated hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEvidence {
    /// SHA-256 of the raw video file bytes.
    pub file_hash: ContentHash,
    /// Whole seconds of playback, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    /// Display resolution such as `1920x1080`, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Per-frame sample hashes in extraction order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_hashes: Option<Vec<ContentHash>>,
    /// SHA-256 of the extracted audio track.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_hash: Option<ContentHash>,
}

/// The certifying creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorInfo {
    /// Stable creator identifier.
    pub user_id: CreatorId,
    /// How strongly the creator's identity was verified.
    pub identity_level: IdentityLevel,
}

/// Identity verification tier of a creator, weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdentityLevel {
    /// Unverified account.
    L0,
    /// Verified email.
    L1,
    /// Verified government ID.
    L2,
    /// Verified ID plus liveness check.
    L3,
}

impl IdentityLevel {
    /// The level's wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L0 => "L0",
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
        }
    }
}

impl std::fmt::Display for IdentityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Certification-time timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceTimestamps {
    /// Server clock at certification, UTC.
    pub server_time_utc: Timestamp,
    /// Token returned by the timestamping authority, once attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsa_token: Option<String>,
}

/// Creator-declared facts about the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceMetadata {
    /// Work title.
    pub title: String,
    /// Generative tool used, when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_tool: Option<String>,
    /// SHA-256 of the generation prompt, when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_hash: Option<ContentHash>,
    /// Whether the work embeds third-party materials.
    pub has_third_party_materials: bool,
}
