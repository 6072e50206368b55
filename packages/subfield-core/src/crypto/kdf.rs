//! # Key Derivation Functions
//!
//! HKDF-SHA256 based derivation for seeds, shared secrets and the Noise
//! chaining key.
//!
//! ## Key Derivation Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    KEY DERIVATION HIERARCHY                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Seed (32 bytes)                                                        │
//! │     └──► HKDF(info="subfield-signing-key-v1")  → Ed25519 secret key    │
//! │                                                                         │
//! │  X25519 output (32 bytes)                                               │
//! │     └──► HKDF(salt=context, info="subfield-cipher-key-v1") → Cipher key│
//! │                                                                         │
//! │  Noise chaining key ck, input key material ikm                          │
//! │     └──► HKDF(salt=ck, ikm, info="") → (output1, output2)              │
//! │           (Noise §4.3: HMAC-based, identical to RFC 5869 with           │
//! │            empty info and 64 bytes of output)                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Domain separation strings for HKDF
///
/// Keys derived for different purposes stay independent even when the
/// input key material is shared.
pub mod domain {
    /// Domain for signing key derivation from a seed
    pub const SIGNING_KEY: &[u8] = b"subfield-signing-key-v1";

    /// Domain for symmetric cipher keys derived from a shared secret
    pub const CIPHER_KEY: &[u8] = b"subfield-cipher-key-v1";
}

/// Keys derived from a master seed
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeys {
    /// Ed25519 secret key (32 bytes)
    pub signing_key: [u8; 32],
}

/// Derive the signing key from a master seed
///
/// The same seed always yields the same key. The seed should carry at least
/// 256 bits of entropy.
pub fn derive_keys_from_seed(seed: &[u8; 32]) -> Result<DerivedKeys> {
    let hkdf = Hkdf::<Sha256>::new(None, seed);

    let mut signing_key = [0u8; 32];
    hkdf.expand(domain::SIGNING_KEY, &mut signing_key)
        .map_err(|_| Error::KeyDerivationFailed("Failed to derive signing key".into()))?;

    Ok(DerivedKeys { signing_key })
}

/// Derive a 32-byte cipher key from raw key agreement output
///
/// `context` is used as salt, binding the key to a conversation or purpose.
pub fn derive_cipher_key(dh_output: &[u8; 32], context: &[u8]) -> Result<[u8; 32]> {
    let hkdf = Hkdf::<Sha256>::new(Some(context), dh_output);

    let mut key = [0u8; 32];
    hkdf.expand(domain::CIPHER_KEY, &mut key)
        .map_err(|_| Error::KeyDerivationFailed("Failed to derive cipher key".into()))?;

    Ok(key)
}

/// Noise `HKDF(chaining_key, input_key_material, 2)`
pub fn hkdf_pair(chaining_key: &[u8; 32], ikm: &[u8]) -> Result<([u8; 32], [u8; 32])> {
    let hkdf = Hkdf::<Sha256>::new(Some(chaining_key), ikm);

    let mut okm = [0u8; 64];
    hkdf.expand(&[], &mut okm)
        .map_err(|_| Error::KeyDerivationFailed("Noise HKDF expansion failed".into()))?;

    let mut first = [0u8; 32];
    let mut second = [0u8; 32];
    first.copy_from_slice(&okm[..32]);
    second.copy_from_slice(&okm[32..]);
    okm.zeroize();

    Ok((first, second))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hkdf::hmac::{Hmac, Mac};

    #[test]
    fn test_derive_keys_deterministic() {
        let seed = [42u8; 32];

        let keys1 = derive_keys_from_seed(&seed).unwrap();
        let keys2 = derive_keys_from_seed(&seed).unwrap();

        assert_eq!(keys1.signing_key, keys2.signing_key);
    }

    #[test]
    fn test_derive_keys_different_seeds() {
        let keys1 = derive_keys_from_seed(&[1u8; 32]).unwrap();
        let keys2 = derive_keys_from_seed(&[2u8; 32]).unwrap();

        assert_ne!(keys1.signing_key, keys2.signing_key);
    }

    #[test]
    fn test_cipher_key_bound_to_context() {
        let dh_output = [42u8; 32];

        let key1 = derive_cipher_key(&dh_output, b"conv-1").unwrap();
        let key2 = derive_cipher_key(&dh_output, b"conv-2").unwrap();
        let key1_again = derive_cipher_key(&dh_output, b"conv-1").unwrap();

        assert_ne!(key1, key2);
        assert_eq!(key1, key1_again);
    }

    #[test]
    fn test_hkdf_pair_matches_noise_definition() {
        // Noise §4.3 spelled out with raw HMAC
        type HmacSha256 = Hmac<Sha256>;
        let ck = [7u8; 32];
        let ikm = [9u8; 32];

        let mut mac = <HmacSha256 as Mac>::new_from_slice(&ck).unwrap();
        mac.update(&ikm);
        let temp_key = mac.finalize().into_bytes();

        let mut mac = <HmacSha256 as Mac>::new_from_slice(&temp_key).unwrap();
        mac.update(&[0x01]);
        let output1 = mac.finalize().into_bytes();

        let mut mac = <HmacSha256 as Mac>::new_from_slice(&temp_key).unwrap();
        mac.update(&output1);
        mac.update(&[0x02]);
        let output2 = mac.finalize().into_bytes();

        let (first, second) = hkdf_pair(&ck, &ikm).unwrap();
        assert_eq!(first.as_slice(), output1.as_slice());
        assert_eq!(second.as_slice(), output2.as_slice());
    }

    #[test]
    fn test_hkdf_pair_empty_ikm() {
        let (first, second) = hkdf_pair(&[1u8; 32], &[]).unwrap();
        assert_ne!(first, second);
    }
}
