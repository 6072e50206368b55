//! # Content Hashing
//!
//! SHA-256 digests with constant-time verification.
//!
//! ```text
//! hash(bytes)                → Digest (32 bytes)
//! hash_verify(bytes, digest) → hash(bytes) == digest, compared in constant time
//! ```
//!
//! Verification walks the full digest regardless of where the first mismatch
//! sits, so it is safe to use when a digest acts as an authenticator.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

/// Size of a digest in bytes (256 bits)
pub const DIGEST_SIZE: usize = 32;

/// A SHA-256 digest
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice (must be exactly 32 bytes)
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; DIGEST_SIZE] = slice.try_into().map_err(|_| {
            Error::Decoding(format!(
                "Digest must be {} bytes, got {}",
                DIGEST_SIZE,
                slice.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    /// Encode as hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from hex string
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| Error::Decoding(format!("Invalid digest hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    /// Constant-time equality
    pub fn ct_eq(&self, other: &Digest) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Hash arbitrary bytes
pub fn hash(bytes: &[u8]) -> Digest {
    Digest(Sha256::digest(bytes).into())
}

/// Hash several slices as if they were concatenated
pub fn hash_concat(parts: &[&[u8]]) -> Digest {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    Digest(hasher.finalize().into())
}

/// Check a claimed digest against input
///
/// Returns `true` iff `hash(bytes) == digest`. The comparison runs in
/// constant time over all 32 bytes.
pub fn hash_verify(bytes: &[u8], digest: &Digest) -> bool {
    hash(bytes).ct_eq(digest)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_vector() {
        // SHA-256("abc"), FIPS 180-2 appendix B.1
        assert_eq!(
            hash(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash(b"hello"), hash(b"hello"));
        assert_ne!(hash(b"hello"), hash(b"hello!"));
    }

    #[test]
    fn test_verify() {
        let digest = hash(b"hello");
        assert!(hash_verify(b"hello", &digest));
        assert!(!hash_verify(b"hellp", &digest));
        assert!(!hash_verify(b"", &digest));
    }

    #[test]
    fn test_verify_rejects_single_bit_flip() {
        let digest = hash(b"hello");
        for i in 0..DIGEST_SIZE {
            let mut bytes = *digest.as_bytes();
            bytes[i] ^= 0x01;
            assert!(!hash_verify(b"hello", &Digest::from_bytes(bytes)));
        }
    }

    #[test]
    fn test_hash_concat_matches_hash() {
        assert_eq!(hash_concat(&[b"hel", b"", b"lo"]), hash(b"hello"));
    }

    #[test]
    fn test_hex_round_trip() {
        let digest = hash(b"round trip");
        assert_eq!(Digest::from_hex(&digest.to_hex()).unwrap(), digest);
        assert_eq!(digest.to_string(), digest.to_hex());
    }

    #[test]
    fn test_from_slice_wrong_length() {
        assert!(matches!(Digest::from_slice(&[0u8; 31]), Err(Error::Decoding(_))));
        assert!(matches!(Digest::from_hex("zz"), Err(Error::Decoding(_))));
    }

    #[test]
    fn test_serde_as_hex() {
        let digest = hash(b"serde");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", digest.to_hex()));
        let restored: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, digest);
    }
}
