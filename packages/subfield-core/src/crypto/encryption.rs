//! # Encryption Module
//!
//! Provides AES-256-GCM encryption for standalone symmetric use.
//!
//! ## Ciphertext Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CIPHER OUTPUT FORMAT                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌────────────────┬──────────────────────────────┬──────────────────┐  │
//! │  │  nonce (12)    │  ciphertext (len(plaintext)) │   tag (16)       │  │
//! │  └────────────────┴──────────────────────────────┴──────────────────┘  │
//! │                                                                         │
//! │  • Nonce is random per call and travels with the ciphertext            │
//! │  • Overhead is 28 bytes for every plaintext length                     │
//! │  • Tag covers ciphertext and optional associated data                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Random 96-bit nonces are safe for up to 2^32 messages per key (birthday
//! bound). Long-lived streams should use a Noise session instead, which
//! counts nonces.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce as AesNonce,
};
use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::kdf::derive_cipher_key;
use crate::error::{Error, Result};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Size of the encryption key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Bytes added to every plaintext by [`Cipher::encrypt`]
pub const CIPHER_OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;

/// A nonce (number used once) for AES-GCM encryption
///
/// **NEVER reuse a nonce with the same key!** Nonce reuse lets an attacker
/// recover the authentication key and forge messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nonce(pub [u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a cryptographically random nonce
    pub fn random() -> Result<Self> {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| Error::RngFailed)?;
        Ok(Self(bytes))
    }

    /// Create from existing bytes
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// A 256-bit symmetric key
///
/// Zeroized when dropped. There is no `Clone`: a key lives in exactly one
/// place, normally inside a [`Cipher`].
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Generate a random key from the OS RNG
    pub fn random() -> Result<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| Error::RngFailed)?;
        Ok(Self(bytes))
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice (must be exactly 32 bytes)
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_SIZE] = slice.try_into().map_err(|_| {
            Error::Decoding(format!("Key must be {} bytes, got {}", KEY_SIZE, slice.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Get the raw key bytes
    ///
    /// Only use this for secure storage. Never log these bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SymmetricKey {}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// A shared secret derived from X25519 key agreement
///
/// Compared in constant time. Zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    /// Create from raw DH output
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes (for key derivation)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encode as hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Derive a cipher key from this shared secret
    ///
    /// Uses HKDF-SHA256 with `context` as salt, so one agreement can feed
    /// several independent ciphers.
    pub fn derive_key(&self, context: &[u8]) -> Result<SymmetricKey> {
        Ok(SymmetricKey(derive_cipher_key(&self.0, context)?))
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SharedSecret {}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Authenticated symmetric cipher bound to one key
///
/// Both the key and the expanded AES key schedule are wiped on drop.
///
/// ## Example
///
/// ```
/// use subfield_core::crypto::Cipher;
///
/// let cipher = Cipher::new(Cipher::random_key().unwrap());
/// let sealed = cipher.encrypt(b"hello").unwrap();
/// assert_eq!(cipher.decrypt(&sealed).unwrap(), b"hello");
/// ```
pub struct Cipher {
    key: SymmetricKey,
    aead: Aes256Gcm,
}

impl Cipher {
    /// Bind a cipher to `key` for its whole lifetime
    pub fn new(key: SymmetricKey) -> Self {
        let aead = Aes256Gcm::new(key.as_bytes().into());
        Self { key, aead }
    }

    /// Generate a fresh random key
    pub fn random_key() -> Result<SymmetricKey> {
        SymmetricKey::random()
    }

    /// Cipher with a fresh random key
    pub fn random() -> Result<Self> {
        Ok(Self::new(Self::random_key()?))
    }

    /// The key this cipher is bound to
    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }

    /// Encrypt `plaintext`
    ///
    /// Output is `nonce ‖ ciphertext ‖ tag`, always
    /// `plaintext.len() + CIPHER_OVERHEAD` bytes.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.encrypt_with_aad(plaintext, &[])
    }

    /// Encrypt `plaintext`, authenticating `aad` alongside it
    ///
    /// `aad` is not included in the output; the same bytes must be supplied
    /// to [`Cipher::decrypt_with_aad`].
    pub fn encrypt_with_aad(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let nonce = Nonce::random()?;

        let payload = Payload {
            msg: plaintext,
            aad,
        };

        let sealed = self
            .aead
            .encrypt(AesNonce::from_slice(&nonce.0), payload)
            .map_err(|e| Error::EncryptionFailed(format!("AES-GCM: {}", e)))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
        out.extend_from_slice(&nonce.0);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Decrypt output of [`Cipher::encrypt`]
    ///
    /// ## Errors
    ///
    /// - `Format` if the input is shorter than `CIPHER_OVERHEAD`
    /// - `Authentication` if the ciphertext was tampered with or the key is
    ///   wrong
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.decrypt_with_aad(ciphertext, &[])
    }

    /// Decrypt output of [`Cipher::encrypt_with_aad`]
    pub fn decrypt_with_aad(&self, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < CIPHER_OVERHEAD {
            return Err(Error::Format(format!(
                "ciphertext is {} bytes, minimum is {}",
                ciphertext.len(),
                CIPHER_OVERHEAD
            )));
        }

        let (nonce, sealed) = ciphertext.split_at(NONCE_SIZE);

        let payload = Payload { msg: sealed, aad };

        self.aead
            .decrypt(AesNonce::from_slice(nonce), payload)
            .map_err(|_| {
                tracing::debug!("Cipher rejected {} byte ciphertext", ciphertext.len());
                Error::Authentication
            })
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher").field("key", &self.key).finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
