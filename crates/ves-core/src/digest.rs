//! # Digest — SHA-256 Over Canonical Bytes
//!
//! The single place in the workspace where content hashes are computed.
//!
//! ## Security Invariant
//!
//! [`sha256_digest()`] takes `&CanonicalBytes`, never `&[u8]`. Any digest a
//! caller can obtain has therefore passed through canonicalization first; the
//! signature makes a hash-of-uncanonicalized-JSON unrepresentable.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::identity::ContentHash;

/// Algorithm tag carried alongside every persisted digest.
///
/// Only SHA-256 exists today. The tag is stored anyway so that a digest read
/// back years later still says what produced it, and a successor algorithm
/// can coexist with old values instead of invalidating them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256 content addressing.
    Sha256,
}

impl DigestAlgorithm {
    /// Wire identifier for this algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 32-byte content digest tagged with the algorithm that produced it.
///
/// Only [`sha256_digest()`] creates these from data; the fields are public
/// so stores can reconstruct a digest they previously serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// Algorithm tag, `sha256` for every digest minted by this crate.
    pub algorithm: DigestAlgorithm,
    /// Raw digest output.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Lowercase hex rendering of the raw bytes, 64 characters.
    pub fn to_hex(&self) -> String {
        let mut hex = String::with_capacity(64);
        for byte in self.bytes {
            hex.push_str(&format!("{byte:02x}"));
        }
        hex
    }

    /// The validated hex-string form Merkle trees and wire payloads carry.
    pub fn to_content_hash(&self) -> ContentHash {
        ContentHash::from_digest_bytes(&self.bytes)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), self.to_hex())
    }
}

/// Hash canonical bytes with SHA-256.
///
/// # Security Invariant
///
/// The `&CanonicalBytes` parameter is the enforcement point: there is no
/// overload for raw byte slices, so evidence and custody digests cannot be
/// computed over anything that skipped canonicalization.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&Sha256::digest(data.as_bytes()));
    ContentDigest {
        algorithm: DigestAlgorithm::Sha256,
        bytes,
    }
}

/// [`sha256_digest()`] followed by hex rendering, for callers that only want
/// the string.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_same_canonical_bytes_same_digest() {
        let cb = CanonicalBytes::new(&json!({"alpha": 1, "beta": 2})).unwrap();
        assert_eq!(sha256_digest(&cb), sha256_digest(&cb));
        assert_eq!(sha256_digest(&cb).algorithm, DigestAlgorithm::Sha256);
    }

    #[test]
    fn test_distinct_payloads_disagree() {
        let one = CanonicalBytes::new(&json!({"n": 1})).unwrap();
        let two = CanonicalBytes::new(&json!({"n": 2})).unwrap();
        assert_ne!(sha256_digest(&one), sha256_digest(&two));
    }

    #[test]
    fn test_hex_is_64_lowercase_chars() {
        let cb = CanonicalBytes::new(&json!({"key": "value"})).unwrap();
        let hex = sha256_hex(&cb);
        assert_eq!(hex.len(), 64);
        assert!(hex
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_display_is_tag_colon_hex() {
        let cb = CanonicalBytes::new(&json!({"k": true})).unwrap();
        let digest = sha256_digest(&cb);
        assert_eq!(digest.to_string(), format!("sha256:{}", digest.to_hex()));
    }

    #[test]
    fn test_empty_object_vector() {
        // Canonical form of {} is the two bytes "{}"; its SHA-256 is fixed.
        let cb = CanonicalBytes::new(&json!({})).unwrap();
        assert_eq!(cb.as_bytes(), b"{}");
        assert_eq!(
            sha256_hex(&cb),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn test_to_content_hash_matches_hex() {
        let cb = CanonicalBytes::new(&json!({"x": 1})).unwrap();
        let digest = sha256_digest(&cb);
        assert_eq!(digest.to_content_hash().as_str(), digest.to_hex());
    }

    #[test]
    fn test_serde_algorithm_tag_lowercase() {
        let tag = serde_json::to_string(&DigestAlgorithm::Sha256).unwrap();
        assert_eq!(tag, r#""sha256""#);
        let back: DigestAlgorithm = serde_json::from_str(&tag).unwrap();
        assert_eq!(back, DigestAlgorithm::Sha256);
    }
}
