//! # ves-core — Foundational Types for the VeriStamp Evidence Stack
//!
//! The leaf crate of the workspace: identifiers, hashes, timestamps, and
//! the canonicalization pipeline everything above builds on. It imports no
//! other `ves-*` crate.
//!
//! ## Key Design Principles
//!
//! 1. **Identifiers are newtypes.** `CertificationId`, `BatchId`,
//!    `CreatorId`, and `ContentHash` each wrap their representation behind
//!    a validating constructor, so a bare string cannot stand in for one.
//!
//! 2. **One road to hashed bytes.** `CanonicalBytes::new()` is the only
//!    constructor of digest input, and `sha256_digest()` takes nothing
//!    else. Code that tried to hash `serde_json::to_vec()` output would
//!    not typecheck, which is what kills the split-canonicalization defect
//!    class.
//!
//! 3. **One clock shape.** `Timestamp` is UTC, whole seconds, `Z` suffix,
//!    and its serde impls refuse anything looser.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ves-*` crates (this is the leaf of the DAG).
//! - `unsafe` is banned.
//! - Non-test code never panics or unwraps.
//! - Public types derive `Debug` and `Clone` and speak serde.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalError, HashParseError, TimestampError};
pub use identity::{BatchId, CertificationId, ContentHash, CreatorId};
pub use temporal::Timestamp;
