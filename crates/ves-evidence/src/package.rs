//! # Evidence Package — Verifiable Export
//!
//! Assembles everything a third party needs to verify one evidence record
//! offline: the canonical evidence, a manifest of every hashed sub-artifact,
//! the Merkle proof and anchor receipt once batched, the ordered custody
//! trail, and the creator-continuity linkage.
//!
//! Export is read-only and reproducible: the document is emitted as
//! canonical JCS bytes, so the same inputs always produce the same bytes,
//! and `package_hash` commits to the rest of the document.

use serde::{Deserialize, Serialize};

use ves_core::{
    sha256_digest, CanonicalBytes, CanonicalError, CertificationId, ContentHash, Timestamp,
};
use ves_merkle::MerkleProof;

use crate::custody::CustodyEvent;
use crate::error::PackageError;
use crate::model::{
    CanonicalEvidence, CreatorInfo, EvidenceMetadata, EvidenceTimestamps, VideoEvidence,
};

/// Type tag of one manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    /// The raw video file.
    VideoFile,
    /// One sampled frame.
    VideoFrame,
    /// The extracted audio track.
    AudioTrack,
    /// The generation prompt.
    Prompt,
}

/// One hashed sub-artifact of the certified content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// What kind of artifact the hash covers.
    pub artifact_type: ArtifactType,
    /// Position within its kind (frame number), where ordering matters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    /// The artifact hash.
    pub hash: ContentHash,
    /// Hash algorithm tag.
    pub algorithm: String,
}

/// Per-creator linkage of successive evidence records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorContinuity {
    /// Evidence hash of the creator's previous valid record, absent for
    /// their first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_evidence_hash: Option<ContentHash>,
    /// Count of the creator's earlier valid records (0 for the first).
    pub chain_position: u64,
}

/// Anchor facts for a batched, anchored record, proof included.
///
/// Present only when the record's batch reached the external ledger; the
/// coordinator attaches proofs after anchoring, so proof and receipt travel
/// together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainAnchor {
    /// Human-readable key of the batch.
    pub batch_key: String,
    /// The committed batch root.
    pub merkle_root: ContentHash,
    /// Inclusion proof tying the evidence hash to `merkle_root`.
    pub merkle_proof: MerkleProof,
    /// Ledger transaction that carries the root.
    pub tx_hash: String,
    /// Block the transaction landed in.
    pub block_number: u64,
    /// Ledger network name.
    pub network: String,
    /// When the anchor transaction was confirmed, UTC.
    pub anchored_at: Timestamp,
}

/// The full downloadable, independently verifiable evidence package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidencePackage {
    /// Evidence schema version, copied from the evidence document.
    pub version: String,
    /// Video content hashes.
    pub video: VideoEvidence,
    /// Creator block of the evidence document.
    pub creator: CreatorInfo,
    /// Timestamp block of the evidence document.
    pub timestamps: EvidenceTimestamps,
    /// Metadata block of the evidence document.
    pub metadata: EvidenceMetadata,
    /// The certified record's identifier.
    pub certification_id: CertificationId,
    /// Public verification page for the record.
    pub verification_url: String,
    /// Every hashed sub-artifact with its type tag.
    pub manifest: Vec<ManifestEntry>,
    /// Linkage to the creator's earlier records.
    pub creator_continuity: CreatorContinuity,
    /// Batch anchor facts, once anchored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain: Option<BlockchainAnchor>,
    /// The record's custody events in append order.
    pub chain_of_custody: Vec<CustodyEvent>,
    /// When this package was assembled, UTC.
    pub exported_at: Timestamp,
    /// SHA-256 over the canonical package with this field absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_hash: Option<ContentHash>,
}

/// Inputs the exporter assembles a package from.
#[derive(Debug, Clone)]
pub struct PackageAssembly {
    /// The certified record's identifier.
    pub certification_id: CertificationId,
    /// The record's evidence document.
    pub evidence: CanonicalEvidence,
    /// Base URL the verification link is built from.
    pub base_url: String,
    /// Continuity facts computed by the caller from its stores.
    pub continuity: CreatorContinuity,
    /// Anchor facts, when the record's batch is anchored.
    pub blockchain: Option<BlockchainAnchor>,
    /// The record's custody events in append order.
    pub custody: Vec<CustodyEvent>,
    /// Assembly clock.
    pub exported_at: Timestamp,
}

impl EvidencePackage {
    /// Assemble and hash a package.
    ///
    /// Recomputes the evidence hash from the document and, when anchor
    /// facts are present, requires the proof leaf to match it: a package
    /// whose proof proves some other hash must never leave the exporter.
    ///
    /// # Errors
    ///
    /// `PackageError::ProofLeafMismatch` on proof/evidence divergence,
    /// `PackageError::Canonical` if the document fails to canonicalize.
    pub fn assemble(input: PackageAssembly) -> Result<Self, PackageError> {
        let evidence_hash = input.evidence.compute_hash()?;
        if let Some(anchor) = &input.blockchain {
            if anchor.merkle_proof.leaf != evidence_hash {
                return Err(PackageError::ProofLeafMismatch {
                    leaf: anchor.merkle_proof.leaf.clone(),
                    evidence_hash,
                });
            }
        }

        let manifest = build_manifest(&input.evidence);
        let verification_url = format!(
            "{}/verify/{}",
            input.base_url.trim_end_matches('/'),
            input.certification_id.as_uuid()
        );

        let mut package = Self {
            version: input.evidence.version.clone(),
            video: input.evidence.video,
            creator: input.evidence.creator,
            timestamps: input.evidence.timestamps,
            metadata: input.evidence.metadata,
            certification_id: input.certification_id,
            verification_url,
            manifest,
            creator_continuity: input.continuity,
            blockchain: input.blockchain,
            chain_of_custody: input.custody,
            exported_at: input.exported_at,
            package_hash: None,
        };
        package.package_hash = Some(package.expected_package_hash()?);
        Ok(package)
    }

    /// The canonical JCS bytes of the package, hash field included.
    ///
    /// This is the exact byte sequence served for download; assembling the
    /// same inputs again yields identical bytes.
    pub fn to_canonical_bytes(&self) -> Result<CanonicalBytes, CanonicalError> {
        CanonicalBytes::new(self)
    }

    /// Recompute what `package_hash` must be: the hash of this package with
    /// the `package_hash` field absent. Verifiers compare this against the
    /// stored value.
    pub fn expected_package_hash(&self) -> Result<ContentHash, CanonicalError> {
        let mut unhashed = self.clone();
        unhashed.package_hash = None;
        let bytes = CanonicalBytes::new(&unhashed)?;
        Ok(sha256_digest(&bytes).to_content_hash())
    }

    /// The evidence document reassembled from the package blocks, as the
    /// offline verifier needs it for hash replay.
    pub fn evidence(&self) -> CanonicalEvidence {
        CanonicalEvidence {
            version: self.version.clone(),
            video: self.video.clone(),
            creator: self.creator.clone(),
            timestamps: self.timestamps.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// List every hashed sub-artifact of the evidence document.
fn build_manifest(evidence: &CanonicalEvidence) -> Vec<ManifestEntry> {
    let algorithm = "sha256".to_string();
    let mut manifest = vec![ManifestEntry {
        artifact_type: ArtifactType::VideoFile,
        index: None,
        hash: evidence.video.file_hash.clone(),
        algorithm: algorithm.clone(),
    }];

    if let Some(frames) = &evidence.video.frame_hashes {
        for (i, hash) in frames.iter().enumerate() {
            manifest.push(ManifestEntry {
                artifact_type: ArtifactType::VideoFrame,
                index: Some(i as u64),
                hash: hash.clone(),
                algorithm: algorithm.clone(),
            });
        }
    }

    if let Some(audio) = &evidence.video.audio_hash {
        manifest.push(ManifestEntry {
            artifact_type: ArtifactType::AudioTrack,
            index: None,
            hash: audio.clone(),
            algorithm: algorithm.clone(),
        });
    }

    if let Some(prompt) = &evidence.metadata.prompt_hash {
        manifest.push(ManifestEntry {
            artifact_type: ArtifactType::Prompt,
            index: None,
            hash: prompt.clone(),
            algorithm,
        });
    }

    manifest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::{CustodyEvent, CustodyEventKind};
    use crate::model::tests::sample_evidence;
    use ves_merkle::MerkleTree;

    fn sample_custody(id: CertificationId, evidence_hash: &ContentHash) -> Vec<CustodyEvent> {
        let ts = Timestamp::parse("2026-03-01T10:00:05Z").unwrap();
        let genesis = CustodyEvent::create(
            id,
            CustodyEventKind::UploadReceived {
                file_name: "clip.mp4".to_string(),
                size_bytes: 2048,
            },
            None,
            ts,
        )
        .unwrap();
        let second = CustodyEvent::create(
            id,
            CustodyEventKind::HashComputed {
                evidence_hash: evidence_hash.clone(),
            },
            Some(genesis.log_hash.clone()),
            ts.plus_secs(1),
        )
        .unwrap();
        vec![genesis, second]
    }

    fn sample_assembly() -> PackageAssembly {
        let evidence = sample_evidence();
        let id = CertificationId::new();
        let evidence_hash = evidence.compute_hash().unwrap();
        PackageAssembly {
            certification_id: id,
            evidence,
            base_url: "https://veristamp.example".to_string(),
            continuity: CreatorContinuity {
                previous_evidence_hash: None,
                chain_position: 0,
            },
            blockchain: None,
            custody: sample_custody(id, &evidence_hash),
            exported_at: Timestamp::parse("2026-03-02T00:00:00Z").unwrap(),
        }
    }

    fn anchored_assembly() -> PackageAssembly {
        let mut input = sample_assembly();
        let evidence_hash = input.evidence.compute_hash().unwrap();
        let other = ContentHash::parse(&"55".repeat(32)).unwrap();
        let tree = MerkleTree::build(&[evidence_hash.clone(), other]).unwrap();
        input.blockchain = Some(BlockchainAnchor {
            batch_key: "batch-20260301-120000".to_string(),
            merkle_root: tree.root().clone(),
            merkle_proof: tree.prove(&evidence_hash).unwrap(),
            tx_hash: "mock-tx-0011aabbccddeeff".to_string(),
            block_number: 8_421_337,
            network: "polygon-amoy".to_string(),
            anchored_at: Timestamp::parse("2026-03-01T12:00:30Z").unwrap(),
        });
        input
    }

    #[test]
    fn test_assemble_unanchored_package() {
        let package = EvidencePackage::assemble(sample_assembly()).unwrap();
        assert!(package.blockchain.is_none());
        assert_eq!(package.chain_of_custody.len(), 2);
        assert!(package.package_hash.is_some());
    }

    #[test]
    fn test_verification_url_shape() {
        let input = sample_assembly();
        let id = input.certification_id;
        let package = EvidencePackage::assemble(input).unwrap();
        assert_eq!(
            package.verification_url,
            format!("https://veristamp.example/verify/{}", id.as_uuid())
        );
    }

    #[test]
    fn test_trailing_slash_base_url() {
        let mut input = sample_assembly();
        input.base_url = "https://veristamp.example/".to_string();
        let package = EvidencePackage::assemble(input).unwrap();
        assert!(!package.verification_url.contains("example//verify"));
    }

    #[test]
    fn test_manifest_covers_every_artifact() {
        let package = EvidencePackage::assemble(sample_assembly()).unwrap();
        // sample evidence: 1 file + 2 frames + 1 audio, no prompt.
        assert_eq!(package.manifest.len(), 4);
        assert_eq!(package.manifest[0].artifact_type, ArtifactType::VideoFile);
        assert_eq!(package.manifest[1].index, Some(0));
        assert_eq!(package.manifest[2].index, Some(1));
        assert!(package
            .manifest
            .iter()
            .all(|entry| entry.algorithm == "sha256"));
    }

    #[test]
    fn test_export_is_byte_reproducible() {
        let input = sample_assembly();
        let a = EvidencePackage::assemble(input.clone()).unwrap();
        let b = EvidencePackage::assemble(input).unwrap();
        assert_eq!(
            a.to_canonical_bytes().unwrap().as_bytes(),
            b.to_canonical_bytes().unwrap().as_bytes()
        );
    }

    #[test]
    fn test_package_hash_verifies() {
        let package = EvidencePackage::assemble(sample_assembly()).unwrap();
        let stored = package.package_hash.clone().unwrap();
        assert_eq!(package.expected_package_hash().unwrap(), stored);
    }

    #[test]
    fn test_package_hash_detects_edit() {
        let mut package = EvidencePackage::assemble(sample_assembly()).unwrap();
        package.metadata.title = "Edited".to_string();
        let stored = package.package_hash.clone().unwrap();
        assert_ne!(package.expected_package_hash().unwrap(), stored);
    }

    #[test]
    fn test_anchored_package_carries_proof() {
        let package = EvidencePackage::assemble(anchored_assembly()).unwrap();
        let anchor = package.blockchain.as_ref().unwrap();
        assert!(ves_merkle::verify_proof(&anchor.merkle_proof));
        assert_eq!(anchor.merkle_proof.root, anchor.merkle_root);
    }

    #[test]
    fn test_proof_leaf_mismatch_rejected() {
        let mut input = anchored_assembly();
        // Proof built for a different leaf than the evidence computes to.
        input.evidence.metadata.title = "Different work".to_string();
        let err = EvidencePackage::assemble(input).unwrap_err();
        assert!(matches!(err, PackageError::ProofLeafMismatch { .. }));
    }

    #[test]
    fn test_evidence_reassembles_to_same_hash() {
        let input = sample_assembly();
        let expected = input.evidence.compute_hash().unwrap();
        let package = EvidencePackage::assemble(input).unwrap();
        assert_eq!(package.evidence().compute_hash().unwrap(), expected);
    }

    #[test]
    fn test_wire_top_level_keys() {
        let package = EvidencePackage::assemble(anchored_assembly()).unwrap();
        let json = serde_json::to_value(&package).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "version",
            "video",
            "creator",
            "timestamps",
            "metadata",
            "certification_id",
            "verification_url",
            "manifest",
            "creator_continuity",
            "blockchain",
            "chain_of_custody",
            "exported_at",
            "package_hash",
        ] {
            assert!(obj.contains_key(key), "missing top-level key {key}");
        }
    }

    #[test]
    fn test_package_roundtrip() {
        let package = EvidencePackage::assemble(anchored_assembly()).unwrap();
        let bytes = package.to_canonical_bytes().unwrap();
        let back: EvidencePackage = serde_json::from_slice(bytes.as_bytes()).unwrap();
        assert_eq!(back, package);
        assert_eq!(
            back.expected_package_hash().unwrap(),
            back.package_hash.clone().unwrap()
        );
    }
}
