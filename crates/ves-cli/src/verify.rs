//! # Verify-Package Subcommand
//!
//! Offline verification of an exported evidence package. Every commitment
//! the package carries is replayed from the document alone: no server, no
//! network, no key material.
//!
//! ## Checks
//!
//! - Evidence hash — the evidence blocks canonicalize and hash.
//! - Package hash — recomputed with `package_hash` absent, compared to the
//!   stored value.
//! - Custody chain — `log_hash` links replay clean, genesis links to null.
//! - Custody commitment — every event belongs to this record and a
//!   `hash_computed` event carries the replayed evidence hash.
//! - Manifest — every hashed sub-artifact is listed, the `video_file` entry
//!   matches `video.file_hash`.
//! - Anchor — the Merkle proof proves the evidence hash and replays to the
//!   committed root (skipped with a warning when unanchored).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use ves_core::ContentHash;
use ves_evidence::{verify_chain, ArtifactType, CustodyEventKind, EvidencePackage};

/// Arguments for the `ves verify-package` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to the exported package JSON file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Per-check tally behind the printed report.
#[derive(Debug, Default)]
struct CheckReport {
    passed: usize,
    failed: usize,
}

impl CheckReport {
    fn pass(&mut self, label: &str) {
        println!("  OK: {label}");
        self.passed += 1;
    }

    fn fail(&mut self, label: &str, detail: &str) {
        println!("  FAIL: {label} — {detail}");
        self.failed += 1;
    }

    fn total(&self) -> usize {
        self.passed + self.failed
    }
}

/// Execute the verify-package subcommand.
///
/// Returns exit code: 0 when every check passes, 1 when any check fails,
/// operational errors (unreadable or unparsable file) propagate.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let package = crate::load_package(&args.file)?;

    println!("Verifying evidence package: {}", args.file.display());
    println!("Certification: {}", package.certification_id);

    let mut report = CheckReport::default();

    let evidence_hash = check_evidence_hash(&package, &mut report);
    check_package_hash(&package, &mut report);
    check_custody_chain(&package, &mut report);
    check_custody_commitment(&package, evidence_hash.as_ref(), &mut report);
    check_manifest(&package, &mut report);
    check_anchor(&package, evidence_hash.as_ref(), &mut report);

    println!("\nChecks: {}/{} passed", report.passed, report.total());

    if report.failed > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

/// Recompute the evidence hash from the package's evidence blocks.
///
/// Every later hash comparison keys off this value, so its failure cascades
/// into the commitment and anchor checks.
fn check_evidence_hash(package: &EvidencePackage, report: &mut CheckReport) -> Option<ContentHash> {
    let label = "evidence blocks canonicalize and hash";
    match package.evidence().compute_hash() {
        Ok(hash) => {
            report.pass(label);
            Some(hash)
        }
        Err(e) => {
            report.fail(label, &e.to_string());
            None
        }
    }
}

/// The stored `package_hash` must equal the hash of the document with the
/// field absent.
fn check_package_hash(package: &EvidencePackage, report: &mut CheckReport) {
    let label = "package_hash matches the canonical document";
    let Some(stored) = &package.package_hash else {
        report.fail(label, "package carries no package_hash");
        return;
    };
    match package.expected_package_hash() {
        Ok(expected) if expected == *stored => report.pass(label),
        Ok(expected) => report.fail(label, &format!("stored {stored}, recomputed {expected}")),
        Err(e) => report.fail(label, &e.to_string()),
    }
}

/// Replay the custody chain's hash links.
fn check_custody_chain(package: &EvidencePackage, report: &mut CheckReport) {
    let label = "custody chain replays clean";
    if package.chain_of_custody.is_empty() {
        report.fail(label, "package carries no custody events");
        return;
    }
    let violations = verify_chain(&package.chain_of_custody);
    if violations.is_empty() {
        report.pass(label);
    } else {
        for violation in &violations {
            report.fail(label, &violation.to_string());
        }
    }
}

/// The custody trail must belong to this record and commit to the evidence
/// hash the document replays to.
fn check_custody_commitment(
    package: &EvidencePackage,
    evidence_hash: Option<&ContentHash>,
    report: &mut CheckReport,
) {
    let label = "custody events belong to this record";
    if package
        .chain_of_custody
        .iter()
        .all(|event| event.certification_id == package.certification_id)
    {
        report.pass(label);
    } else {
        report.fail(label, "an event carries a foreign certification_id");
    }

    let label = "custody trail commits to the evidence hash";
    let Some(expected) = evidence_hash else {
        report.fail(label, "evidence hash unavailable");
        return;
    };
    let committed = package.chain_of_custody.iter().any(|event| {
        matches!(&event.kind, CustodyEventKind::HashComputed { evidence_hash } if evidence_hash == expected)
    });
    if committed {
        report.pass(label);
    } else {
        report.fail(label, "no hash_computed event carries the replayed hash");
    }
}

/// Every hashed sub-artifact of the evidence must appear in the manifest.
fn check_manifest(package: &EvidencePackage, report: &mut CheckReport) {
    let label = "manifest covers every sub-artifact";

    let frame_count = package.video.frame_hashes.as_ref().map_or(0, Vec::len);
    let mut expected = 1 + frame_count;
    if package.video.audio_hash.is_some() {
        expected += 1;
    }
    if package.metadata.prompt_hash.is_some() {
        expected += 1;
    }

    if package.manifest.len() != expected {
        report.fail(
            label,
            &format!("{} entries, expected {expected}", package.manifest.len()),
        );
        return;
    }

    let file_entry = package
        .manifest
        .iter()
        .find(|entry| entry.artifact_type == ArtifactType::VideoFile);
    match file_entry {
        Some(entry) if entry.hash == package.video.file_hash => report.pass(label),
        Some(_) => report.fail(label, "video_file entry does not match video.file_hash"),
        None => report.fail(label, "no video_file entry"),
    }
}

/// Replay the Merkle inclusion proof against the committed root.
fn check_anchor(
    package: &EvidencePackage,
    evidence_hash: Option<&ContentHash>,
    report: &mut CheckReport,
) {
    let Some(anchor) = &package.blockchain else {
        println!("  WARN: package is not anchored, merkle checks skipped");
        return;
    };

    let label = "merkle proof proves the evidence hash";
    match evidence_hash {
        Some(expected) if anchor.merkle_proof.leaf == *expected => report.pass(label),
        Some(_) => report.fail(label, "proof leaf differs from the replayed evidence hash"),
        None => report.fail(label, "evidence hash unavailable"),
    }

    let label = "merkle proof replays to the committed root";
    if anchor.merkle_proof.root != anchor.merkle_root {
        report.fail(label, "proof root differs from blockchain.merkle_root");
    } else if ves_merkle::verify_proof(&anchor.merkle_proof) {
        report.pass(label);
    } else {
        report.fail(label, "path replay does not reach the root");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::path::Path;

    use ves_core::{CertificationId, CreatorId, Timestamp};
    use ves_evidence::{
        BlockchainAnchor, CreatorContinuity, CustodyEvent, EvidenceBuilder, IdentityLevel,
        PackageAssembly,
    };
    use ves_merkle::MerkleTree;

    fn hex(seed: &str) -> String {
        seed.repeat(32)
    }

    pub(crate) fn sample_package(anchored: bool) -> EvidencePackage {
        let built = EvidenceBuilder::new(
            hex("ab"),
            CreatorId::new(),
            IdentityLevel::L2,
            "Rooftop timelapse",
        )
        .frame_hashes(vec![hex("01"), hex("02")])
        .server_time_utc(Timestamp::parse("2026-03-01T10:00:00Z").unwrap())
        .build()
        .unwrap();
        let evidence_hash = built.evidence_hash;
        let id = CertificationId::new();

        let ts = Timestamp::parse("2026-03-01T10:00:01Z").unwrap();
        let genesis = CustodyEvent::create(
            id,
            CustodyEventKind::UploadReceived {
                file_name: "rooftop.mp4".to_string(),
                size_bytes: 4096,
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

        let blockchain = if anchored {
            let other = ContentHash::parse(&hex("55")).unwrap();
            let tree = MerkleTree::build(&[evidence_hash.clone(), other]).unwrap();
            Some(BlockchainAnchor {
                batch_key: "batch-20260301-110000".to_string(),
                merkle_root: tree.root().clone(),
                merkle_proof: tree.prove(&evidence_hash).unwrap(),
                tx_hash: "mock-tx-00aa11bb22cc33dd".to_string(),
                block_number: 4_200_000,
                network: "polygon-amoy".to_string(),
                anchored_at: ts.plus_secs(120),
            })
        } else {
            None
        };

        EvidencePackage::assemble(PackageAssembly {
            certification_id: id,
            evidence: built.evidence,
            base_url: "https://veristamp.example".to_string(),
            continuity: CreatorContinuity {
                previous_evidence_hash: None,
                chain_position: 0,
            },
            blockchain,
            custody: vec![genesis, second],
            exported_at: ts.plus_secs(300),
        })
        .unwrap()
    }

    fn write_package(dir: &Path, package: &EvidencePackage) -> PathBuf {
        let path = dir.join("package.json");
        let bytes = package.to_canonical_bytes().unwrap();
        std::fs::write(&path, bytes.as_bytes()).unwrap();
        path
    }

    fn write_value(dir: &Path, value: &serde_json::Value) -> PathBuf {
        let path = dir.join("package.json");
        std::fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
        path
    }

    #[test]
    fn clean_unanchored_package_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_package(dir.path(), &sample_package(false));

        let code = run_verify(&VerifyArgs { file: path }).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn clean_anchored_package_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_package(dir.path(), &sample_package(true));

        let code = run_verify(&VerifyArgs { file: path }).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn tampered_title_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = serde_json::to_value(sample_package(true)).unwrap();
        doc["metadata"]["title"] = serde_json::json!("Someone else's work");
        let path = write_value(dir.path(), &doc);

        let code = run_verify(&VerifyArgs { file: path }).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn tampered_merkle_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = serde_json::to_value(sample_package(true)).unwrap();
        doc["blockchain"]["merkle_root"] = serde_json::json!(hex("11"));
        let path = write_value(dir.path(), &doc);

        let code = run_verify(&VerifyArgs { file: path }).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn tampered_custody_event_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = serde_json::to_value(sample_package(false)).unwrap();
        doc["chain_of_custody"][0]["event_data"]["file_name"] =
            serde_json::json!("swapped.mp4");
        let path = write_value(dir.path(), &doc);

        let code = run_verify(&VerifyArgs { file: path }).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn missing_package_hash_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = serde_json::to_value(sample_package(false)).unwrap();
        doc.as_object_mut().unwrap().remove("package_hash");
        let path = write_value(dir.path(), &doc);

        let code = run_verify(&VerifyArgs { file: path }).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn empty_custody_chain_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut package = sample_package(false);
        package.chain_of_custody.clear();
        package.package_hash = Some(package.expected_package_hash().unwrap());
        let path = write_package(dir.path(), &package);

        let code = run_verify(&VerifyArgs { file: path }).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn missing_file_is_operational_error() {
        let result = run_verify(&VerifyArgs {
            file: PathBuf::from("/tmp/ves-no-such-package-xyz.json"),
        });
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("failed to read file"));
    }

    #[test]
    fn unparsable_file_is_operational_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, b"not a package {{{").unwrap();

        let result = run_verify(&VerifyArgs { file: path });
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("failed to parse package"));
    }

    // ── Check-level coverage ─────────────────────────────────────────

    #[test]
    fn manifest_check_detects_dropped_entry() {
        let mut package = sample_package(false);
        package.manifest.pop();

        let mut report = CheckReport::default();
        check_manifest(&package, &mut report);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn manifest_check_detects_swapped_file_hash() {
        let mut package = sample_package(false);
        package.manifest[0].hash = ContentHash::parse(&hex("77")).unwrap();

        let mut report = CheckReport::default();
        check_manifest(&package, &mut report);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn commitment_check_detects_foreign_event() {
        let mut package = sample_package(false);
        let foreign = CustodyEvent::create(
            CertificationId::new(),
            CustodyEventKind::FramesExtracted { frame_count: 2 },
            Some(package.chain_of_custody[1].log_hash.clone()),
            Timestamp::parse("2026-03-01T10:00:05Z").unwrap(),
        )
        .unwrap();
        package.chain_of_custody.push(foreign);

        let evidence_hash = package.evidence().compute_hash().unwrap();
        let mut report = CheckReport::default();
        check_custody_commitment(&package, Some(&evidence_hash), &mut report);
        assert_eq!(report.failed, 1);
        assert_eq!(report.passed, 1);
    }

    #[test]
    fn anchor_check_detects_leaf_mismatch() {
        let mut package = sample_package(true);
        // Rebuild the anchor around a leaf the evidence does not hash to.
        let stray = ContentHash::parse(&hex("99")).unwrap();
        let tree = MerkleTree::build(&[stray.clone()]).unwrap();
        let anchor = package.blockchain.as_mut().unwrap();
        anchor.merkle_proof = tree.prove(&stray).unwrap();
        anchor.merkle_root = tree.root().clone();

        let evidence_hash = package.evidence().compute_hash().unwrap();
        let mut report = CheckReport::default();
        check_anchor(&package, Some(&evidence_hash), &mut report);
        assert_eq!(report.failed, 1);
        assert_eq!(report.passed, 1);
    }

    #[test]
    fn unanchored_package_skips_anchor_checks() {
        let package = sample_package(false);
        let evidence_hash = package.evidence().compute_hash().unwrap();

        let mut report = CheckReport::default();
        check_anchor(&package, Some(&evidence_hash), &mut report);
        assert_eq!(report.total(), 0);
    }
}
