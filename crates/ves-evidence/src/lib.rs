//! # VeriStamp Evidence — Documents, Custody, Packages
//!
//! The evidence layer of the VeriStamp stack: building validated canonical
//! evidence documents, recording their hash-chained custody trail, and
//! exporting self-contained verification packages.
//!
//! ## Security Invariant
//!
//! Every hash in this crate is computed over [`ves_core::CanonicalBytes`],
//! never over ad-hoc serializations. The evidence hash is the Merkle leaf;
//! the custody log hash chains each event to its predecessor; the package
//! hash commits to the full export. A verifier replays all three from the
//! package alone.
//!
//! ## Module Map
//!
//! - [`model`]: the canonical evidence document and its blocks.
//! - [`builder`]: validated construction of evidence documents.
//! - [`custody`]: append-only hash-chained custody events.
//! - [`package`]: the downloadable verification package.

pub mod builder;
pub mod custody;
pub mod error;
pub mod model;
pub mod package;

pub use builder::{BuiltEvidence, EvidenceBuilder};
pub use custody::{verify_chain, ChainViolation, CustodyEvent, CustodyEventKind};
pub use error::{EvidenceError, PackageError};
pub use model::{
    CanonicalEvidence, CreatorInfo, EvidenceMetadata, EvidenceTimestamps, IdentityLevel,
    VideoEvidence, EVIDENCE_SCHEMA_VERSION,
};
pub use package::{
    ArtifactType, BlockchainAnchor, CreatorContinuity, EvidencePackage, ManifestEntry,
    PackageAssembly,
};
