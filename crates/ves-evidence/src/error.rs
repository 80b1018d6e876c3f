//! Error types for evidence construction and package export.

use thiserror::Error;

use ves_core::{CanonicalError, ContentHash};

/// Error constructing or re-hashing evidence.
#[derive(Error, Debug)]
pub enum EvidenceError {
    /// A field failed boundary validation. Invalid evidence is rejected
    /// before anything is persisted.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Dotted field path (e.g. `video.file_hash`).
        field: String,
        /// What was wrong with the value.
        reason: String,
    },

    /// Canonicalization of the evidence document failed.
    #[error(transparent)]
    Canonical(#[from] CanonicalError),
}

/// Error assembling an evidence package for export.
#[derive(Error, Debug)]
pub enum PackageError {
    /// The attached Merkle proof proves a different hash than the evidence
    /// in the package computes to.
    #[error("merkle proof leaf {leaf} does not match evidence hash {evidence_hash}")]
    ProofLeafMismatch {
        /// The leaf the proof commits to.
        leaf: ContentHash,
        /// The hash recomputed from the canonical evidence.
        evidence_hash: ContentHash,
    },

    /// Canonicalization of the package document failed.
    #[error(transparent)]
    Canonical(#[from] CanonicalError),
}
