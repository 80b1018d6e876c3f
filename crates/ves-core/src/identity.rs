//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers in the evidence stack. These prevent
//! accidental identifier confusion — you cannot pass a `BatchId` where a
//! `CertificationId` is expected.
//!
//! `ContentHash` is the validated form of every SHA-256 hex string that
//! crosses a boundary (file hashes, frame hashes, evidence hashes, Merkle
//! nodes). Construction normalizes and validates, so downstream code never
//! re-checks hex shape.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HashParseError;

/// Unique identifier for one certified evidence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertificationId(pub Uuid);

/// Unique identifier for one Merkle anchoring batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

/// Unique identifier for a content creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatorId(pub Uuid);

impl CertificationId {
    /// Generate a new random certification identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl BatchId {
    /// Generate a new random batch identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl CreatorId {
    /// Generate a new random creator identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CertificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for CreatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CertificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cert:{}", self.0)
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "batch:{}", self.0)
    }
}

impl std::fmt::Display for CreatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "creator:{}", self.0)
    }
}

/// A validated lowercase SHA-256 hex string (64 chars).
///
/// The inner string is private; the only constructors are [`parse()`], which
/// trims, lowercases, and validates, and [`from_digest_bytes()`], which
/// hex-encodes a raw digest. Equality, hashing, and ordering are plain string
/// operations — the lexicographic order over two hashes is the order used
/// when combining Merkle siblings.
///
/// [`parse()`]: ContentHash::parse
/// [`from_digest_bytes()`]: ContentHash::from_digest_bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Parse a hash from external input.
    ///
    /// Leading/trailing whitespace is trimmed and uppercase hex is folded to
    /// lowercase before validation; anything that is not then exactly 64 hex
    /// chars is rejected.
    pub fn parse(input: &str) -> Result<Self, HashParseError> {
        let normalized = input.trim().to_lowercase();
        if normalized.len() != 64 {
            return Err(HashParseError::BadLength {
                length: normalized.chars().count(),
            });
        }
        if let Some((index, character)) = normalized
            .chars()
            .enumerate()
            .find(|(_, c)| !c.is_ascii_hexdigit())
        {
            return Err(HashParseError::NonHexCharacter { character, index });
        }
        Ok(Self(normalized))
    }

    /// Hex-encode a raw 32-byte digest. Infallible: the output is always a
    /// valid lowercase hex-64 string.
    pub fn from_digest_bytes(bytes: &[u8; 32]) -> Self {
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// The hash as a lowercase hex string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back to the raw 32-byte digest.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, chunk) in self.0.as_bytes().chunks(2).enumerate() {
            // Both chars are validated hex digits, so this cannot fail.
            let hi = hex_nibble(chunk[0]);
            let lo = hex_nibble(chunk[1]);
            out[i] = (hi << 4) | lo;
        }
        out
    }
}

fn hex_nibble(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => 0,
    }
}

impl TryFrom<String> for ContentHash {
    type Error = HashParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
