//! # Evidence Builder — Validated Construction
//!
//! Assembles a [`CanonicalEvidence`] from raw, untrusted inputs. Every hash
//! field is parsed through `ContentHash` (trim, lowercase, hex-64 check)
//! and the whole document is hashed on build. Construction is a pure
//! transform: nothing here persists anything.

use ves_core::{ContentHash, CreatorId, Timestamp};

use crate::error::EvidenceError;
use crate::model::{
    CanonicalEvidence, CreatorInfo, EvidenceMetadata, EvidenceTimestamps, IdentityLevel,
    VideoEvidence, EVIDENCE_SCHEMA_VERSION,
};

/// A validated evidence document together with its hash.
///
/// The hash is provisional until a TSA token is attached (if one ever is);
/// [`CanonicalEvidence::attach_tsa_token`] recomputes it. Only the hash
/// current at batching time becomes the Merkle leaf.
#[derive(Debug, Clone)]
pub struct BuiltEvidence {
    /// The immutable-once-batched evidence document.
    pub evidence: CanonicalEvidence,
    /// `SHA256(canonicalize(evidence))` at build time.
    pub evidence_hash: ContentHash,
}

/// Builder over raw certification inputs.
///
/// Required fields are constructor arguments; everything optional has a
/// setter. `server_time_utc` defaults to the current server clock and is
/// overridable for deterministic tests.
#[derive(Debug, Clone)]
pub struct EvidenceBuilder {
    file_hash: String,
    duration_seconds: Option<u64>,
    resolution: Option<String>,
    frame_hashes: Vec<String>,
    audio_hash: Option<String>,
    creator_id: CreatorId,
    identity_level: IdentityLevel,
    server_time_utc: Timestamp,
    title: String,
    ai_tool: Option<String>,
    prompt_hash: Option<String>,
    has_third_party_materials: bool,
}

impl EvidenceBuilder {
    /// Start a builder from the required certification inputs.
    pub fn new(
        file_hash: impl Into<String>,
        creator_id: CreatorId,
        identity_level: IdentityLevel,
        title: impl Into<String>,
    ) -> Self {
        Self {
            file_hash: file_hash.into(),
            duration_seconds: None,
            resolution: None,
            frame_hashes: Vec::new(),
            audio_hash: None,
            creator_id,
            identity_level,
            server_time_utc: Timestamp::now(),
            title: title.into(),
            ai_tool: None,
            prompt_hash: None,
            has_third_party_materials: false,
        }
    }

    /// Playback length in whole seconds.
    pub fn duration_seconds(mut self, secs: u64) -> Self {
        self.duration_seconds = Some(secs);
        self
    }

    /// Display resolution string such as `1920x1080`.
    pub fn resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    /// Frame sample hashes in extraction order. An empty list means no
    /// frame evidence: the field is omitted from the document.
    pub fn frame_hashes(mut self, hashes: Vec<String>) -> Self {
        self.frame_hashes = hashes;
        self
    }

    /// Hash of the extracted audio track.
    pub fn audio_hash(mut self, hash: impl Into<String>) -> Self {
        self.audio_hash = Some(hash.into());
        self
    }

    /// Override the certification clock (tests and replays).
    pub fn server_time_utc(mut self, ts: Timestamp) -> Self {
        self.server_time_utc = ts;
        self
    }

    /// Generative tool declaration.
    pub fn ai_tool(mut self, tool: impl Into<String>) -> Self {
        self.ai_tool = Some(tool.into());
        self
    }

    /// Hash of the generation prompt.
    pub fn prompt_hash(mut self, hash: impl Into<String>) -> Self {
        self.prompt_hash = Some(hash.into());
        self
    }

    /// Declare embedded third-party materials.
    pub fn has_third_party_materials(mut self, flag: bool) -> Self {
        self.has_third_party_materials = flag;
        self
    }

    /// Validate every field, assemble the document, and hash it.
    ///
    /// # Errors
    ///
    /// `EvidenceError::Validation` naming the first offending field, or
    /// `EvidenceError::Canonical` if the assembled document fails to
    /// canonicalize.
    pub fn build(self) -> Result<BuiltEvidence, EvidenceError> {
        let file_hash = parse_hash_field("video.file_hash", &self.file_hash)?;

        let frame_hashes = if self.frame_hashes.is_empty() {
            None
        } else {
            let parsed: Result<Vec<ContentHash>, EvidenceError> = self
                .frame_hashes
                .iter()
                .enumerate()
                .map(|(i, h)| parse_hash_field(&format!("video.frame_hashes.{i}"), h))
                .collect();
            Some(parsed?)
        };

        let audio_hash = self
            .audio_hash
            .as_deref()
            .map(|h| parse_hash_field("video.audio_hash", h))
            .transpose()?;

        let prompt_hash = self
            .prompt_hash
            .as_deref()
            .map(|h| parse_hash_field("metadata.prompt_hash", h))
            .transpose()?;

        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(EvidenceError::Validation {
                field: "metadata.title".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let evidence = CanonicalEvidence {
            version: EVIDENCE_SCHEMA_VERSION.to_string(),
            video: VideoEvidence {
                file_hash,
                duration_seconds: self.duration_seconds,
                resolution: self.resolution,
                frame_hashes,
                audio_hash,
            },
            creator: CreatorInfo {
                user_id: self.creator_id,
                identity_level: self.identity_level,
            },
            timestamps: EvidenceTimestamps {
                server_time_utc: self.server_time_utc,
                tsa_token: None,
            },
            metadata: EvidenceMetadata {
                title,
                ai_tool: self.ai_tool,
                prompt_hash,
                has_third_party_materials: self.has_third_party_materials,
            },
        };

        let evidence_hash = evidence.compute_hash()?;
        Ok(BuiltEvidence {
            evidence,
            evidence_hash,
        })
    }
}

fn parse_hash_field(field: &str, input: &str) -> Result<ContentHash, EvidenceError> {
    ContentHash::parse(input).map_err(|e| EvidenceError::Validation {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(seed: &str) -> String {
        seed.repeat(32)
    }

    fn base_builder() -> EvidenceBuilder {
        EvidenceBuilder::new(
            hex("ab"),
            CreatorId::new(),
            IdentityLevel::L1,
            "Field recording",
        )
        .server_time_utc(Timestamp::parse("2026-03-01T10:00:00Z").unwrap())
    }

    #[test]
    fn test_minimal_build() {
        let built = base_builder().build().unwrap();
        assert_eq!(built.evidence.version, EVIDENCE_SCHEMA_VERSION);
        assert_eq!(built.evidence.video.file_hash.as_str(), hex("ab"));
        assert!(built.evidence.video.frame_hashes.is_none());
        assert!(!built.evidence.metadata.has_third_party_materials);
        assert_eq!(
            built.evidence_hash,
            built.evidence.compute_hash().unwrap()
        );
    }

    #[test]
    fn test_file_hash_normalized() {
        let built = EvidenceBuilder::new(
            format!("  {}  ", hex("AB").to_uppercase()),
            CreatorId::new(),
            IdentityLevel::L0,
            "t",
        )
        .build()
        .unwrap();
        assert_eq!(built.evidence.video.file_hash.as_str(), hex("ab"));
    }

    #[test]
    fn test_invalid_file_hash_rejected() {
        let err = EvidenceBuilder::new("zz", CreatorId::new(), IdentityLevel::L0, "t")
            .build()
            .unwrap_err();
        match err {
            EvidenceError::Validation { field, .. } => assert_eq!(field, "video.file_hash"),
            other => panic!("expected Validation, got: {other}"),
        }
    }

    #[test]
    fn test_invalid_frame_hash_names_index() {
        let err = base_builder()
            .frame_hashes(vec![hex("01"), "broken".to_string()])
            .build()
            .unwrap_err();
        match err {
            EvidenceError::Validation { field, .. } => {
                assert_eq!(field, "video.frame_hashes.1")
            }
            other => panic!("expected Validation, got: {other}"),
        }
    }

    #[test]
    fn test_empty_title_rejected() {
        let err = EvidenceBuilder::new(hex("ab"), CreatorId::new(), IdentityLevel::L0, "   ")
            .build()
            .unwrap_err();
        match err {
            EvidenceError::Validation { field, .. } => assert_eq!(field, "metadata.title"),
            other => panic!("expected Validation, got: {other}"),
        }
    }

    #[test]
    fn test_empty_frame_list_omitted() {
        let built = base_builder().frame_hashes(Vec::new()).build().unwrap();
        assert!(built.evidence.video.frame_hashes.is_none());
    }

    #[test]
    fn test_full_build_round_trip() {
        let built = base_builder()
            .duration_seconds(90)
            .resolution("3840x2160")
            .frame_hashes(vec![hex("01"), hex("02"), hex("03")])
            .audio_hash(hex("cd"))
            .ai_tool("frameforge")
            .prompt_hash(hex("ef"))
            .has_third_party_materials(true)
            .build()
            .unwrap();

        let v = &built.evidence.video;
        assert_eq!(v.duration_seconds, Some(90));
        assert_eq!(v.frame_hashes.as_ref().unwrap().len(), 3);
        assert_eq!(v.audio_hash.as_ref().unwrap().as_str(), hex("cd"));
        assert!(built.evidence.metadata.has_third_party_materials);
    }

    #[test]
    fn test_same_inputs_same_hash() {
        let a = base_builder().build().unwrap();
        let b = base_builder().build().unwrap();
        // Same creator id is required for equality, so rebuild with a's.
        let mut builder = base_builder();
        builder.creator_id = a.evidence.creator.user_id;
        let c = builder.build().unwrap();
        assert_eq!(a.evidence_hash, c.evidence_hash);
        assert_ne!(a.evidence.creator.user_id, b.evidence.creator.user_id);
    }

    #[test]
    fn test_tsa_attach_after_build() {
        let mut built = base_builder().build().unwrap();
        let provisional = built.evidence_hash.clone();
        let final_hash = built.evidence.attach_tsa_token("token").unwrap();
        assert_ne!(provisional, final_hash);
    }
}
