//! # Merkle Tree — Batch Commitment Over Evidence Hashes
//!
//! Builds a binary tree over an ordered list of evidence hashes (lowercase
//! hex-64), caches every level, and derives inclusion proofs from the cache.
//!
//! ## Algorithm
//!
//! - Odd node count at any level is padded by duplicating the last node
//!   before pairing (Bitcoin-style). A duplicated subtree lets two different
//!   leaf lists share a root in pathological constructions, so the leaf
//!   count is persisted alongside every root as part of the commitment.
//! - A parent is `SHA256(UTF-8(min(l,r) || max(l,r)))` over the two child
//!   hex strings, hex-encoded lowercase. Ordering the pair makes the parent
//!   independent of which side each child occupied, so proof verification
//!   needs no left/right decision.
//! - Build, prove, and verify all flow through the one `combine()` function.
//!
//! ## Proof Wire Format
//!
//! `{leaf, path[], indices[], root}` — `path[i]` is the sibling hash at
//! level `i`, `indices[i]` the sibling's index at that level. The indices
//! record where each sibling sat during construction; with the ordered
//! combine they are not consulted for hashing, but they stay in the wire
//! format so positions remain auditable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use ves_core::ContentHash;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Contract violations in Merkle operations. Both variants are programming
/// errors in the caller, fatal to the calling operation.
#[derive(Error, Debug)]
pub enum MerkleError {
    /// A tree cannot be built over zero leaves.
    #[error("cannot build a Merkle tree over an empty batch")]
    EmptyBatch,

    /// Proof requested for a hash that is not a leaf of this tree.
    #[error("leaf {leaf} is not present in the tree")]
    LeafNotFound {
        /// The absent hash.
        leaf: ContentHash,
    },
}

// ---------------------------------------------------------------------------
// Node combination
// ---------------------------------------------------------------------------

/// Combine two nodes into their parent.
///
/// SHA-256 over the UTF-8 bytes of the lexicographically ordered
/// concatenation of the two hex strings. Every parent computation in build,
/// proof generation, and proof verification uses this function; there is no
/// second combine path to drift from.
fn combine(a: &ContentHash, b: &ContentHash) -> ContentHash {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(first.as_str().as_bytes());
    hasher.update(second.as_str().as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    ContentHash::from_digest_bytes(&bytes)
}

// ---------------------------------------------------------------------------
// Tree construction
// ---------------------------------------------------------------------------

/// A binary Merkle tree with cached levels.
///
/// `levels[0]` is the padded leaf level; the last level holds exactly the
/// root. Every cached level below the root has even length, so sibling
/// lookup (`pos ^ 1`) is always in range.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<ContentHash>>,
    leaf_count: usize,
}

impl MerkleTree {
    /// Build a tree over an ordered, non-empty leaf list.
    ///
    /// Determinism: the same ordered list always produces the same root.
    /// Callers fix leaf order once at selection time; this function never
    /// reorders.
    ///
    /// # Errors
    ///
    /// `MerkleError::EmptyBatch` if `leaves` is empty.
    pub fn build(leaves: &[ContentHash]) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyBatch);
        }

        let mut levels: Vec<Vec<ContentHash>> = Vec::new();
        let mut current: Vec<ContentHash> = leaves.to_vec();

        while current.len() > 1 {
            if current.len() % 2 == 1 {
                let dup = current[current.len() - 1].clone();
                current.push(dup);
            }
            let next: Vec<ContentHash> = current
                .chunks(2)
                .map(|pair| combine(&pair[0], &pair[1]))
                .collect();
            levels.push(current);
            current = next;
        }
        levels.push(current);

        Ok(Self {
            levels,
            leaf_count: leaves.len(),
        })
    }

    /// The root hash committed to the external ledger.
    pub fn root(&self) -> &ContentHash {
        // build() guarantees a final level with exactly one node.
        &self.levels[self.levels.len() - 1][0]
    }

    /// Number of leaves the tree was built over (padding excluded).
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of levels including the root level (1 for a single leaf).
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    // -----------------------------------------------------------------------
    // Proof generation
    // -----------------------------------------------------------------------

    /// Generate the inclusion proof for one leaf hash.
    ///
    /// When the same hash appears at multiple positions, the proof for the
    /// first occurrence is returned; any occurrence's proof verifies against
    /// the same root.
    ///
    /// # Errors
    ///
    /// `MerkleError::LeafNotFound` if the hash is not a leaf of this tree.
    pub fn prove(&self, leaf: &ContentHash) -> Result<MerkleProof, MerkleError> {
        let pos = self.levels[0]
            .iter()
            .position(|l| l == leaf)
            .ok_or_else(|| MerkleError::LeafNotFound { leaf: leaf.clone() })?;
        Ok(self.proof_at(pos))
    }

    /// Generate proofs for every leaf from the cached levels.
    ///
    /// One O(log n) walk per leaf over the already-built levels, O(n log n)
    /// total. The batch fan-out depends on this: rebuilding the tree per
    /// leaf would be O(n^2 log n) at the 1000-leaf batch limit.
    ///
    /// Returns a map keyed by leaf hash; duplicate leaves collapse to the
    /// first occurrence's proof.
    pub fn prove_all(&self) -> HashMap<ContentHash, MerkleProof> {
        let mut proofs = HashMap::with_capacity(self.leaf_count);
        for pos in 0..self.leaf_count {
            let leaf = self.levels[0][pos].clone();
            proofs.entry(leaf).or_insert_with(|| self.proof_at(pos));
        }
        proofs
    }

    /// Walk from the leaf at `pos` to the root, collecting siblings.
    fn proof_at(&self, mut pos: usize) -> MerkleProof {
        let leaf = self.levels[0][pos].clone();
        let mut path = Vec::with_capacity(self.levels.len() - 1);
        let mut indices = Vec::with_capacity(self.levels.len() - 1);

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = pos ^ 1;
            path.push(level[sibling].clone());
            indices.push(sibling);
            pos /= 2;
        }

        MerkleProof {
            leaf,
            path,
            indices,
            root: self.root().clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Proofs
// ---------------------------------------------------------------------------

/// An inclusion proof tying one leaf to a batch root.
///
/// Stored on the evidence record at fan-out time and embedded in exported
/// packages, so the wire shape is part of the public verification contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The evidence hash being proven.
    pub leaf: ContentHash,
    /// Sibling hash at each level, leaf level first.
    pub path: Vec<ContentHash>,
    /// The sibling's index at each level.
    pub indices: Vec<usize>,
    /// The batch root the proof resolves to.
    pub root: ContentHash,
}

/// Replay a proof and compare against its claimed root.
///
/// Malformed proofs (path/indices length mismatch) verify false rather than
/// panicking: a proof from an untrusted package must never abort the
/// verifier.
pub fn verify_proof(proof: &MerkleProof) -> bool {
    if proof.path.len() != proof.indices.len() {
        return false;
    }
    let mut current = proof.leaf.clone();
    for sibling in &proof.path {
        current = combine(&current, sibling);
    }
    current == proof.root
}
