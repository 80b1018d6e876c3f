//! # ves-merkle — Merkle Batch Commitment
//!
//! Builds a binary Merkle tree over a batch of evidence hashes, computes the
//! root that gets anchored externally, and produces the per-leaf inclusion
//! proofs that let any holder of an evidence package verify membership
//! without the rest of the batch.
//!
//! The engine is stateless and pure: same ordered leaf list, same root,
//! independent of execution environment. The batch coordinator fixes leaf
//! order once at selection time; this crate never reorders.

pub mod tree;

pub use tree::{verify_proof, MerkleError, MerkleProof, MerkleTree};
