//! # Key Management
//!
//! This module handles asymmetric key generation, serialization and key
//! agreement.
//!
//! ## Key Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          KEY TYPES                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  PrivateKey (Ed25519 seed, 32 bytes)                            │   │
//! │  │  • Signing                                                      │   │
//! │  │  • X25519 agreement via its clamped scalar                      │   │
//! │  │  • Zeroized on drop, never rendered as text by Display/Debug    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  PublicKey (Ed25519 compressed point, 32 bytes)                 │   │
//! │  │  • Signature verification                                       │   │
//! │  │  • X25519 agreement via the Edwards → Montgomery map            │   │
//! │  │  • Canonical string: lowercase base32, 52 chars                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  KeyPair                                                        │   │
//! │  │  • Owns one PrivateKey and its derived PublicKey                │   │
//! │  │  • Serialized as seed ‖ public key (64 bytes)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One identity key serves both signing and key agreement. Both parties run
//! X25519 on the Montgomery form of the other's Ed25519 point, so
//! `a.shared_secret(B) == b.shared_secret(A)`.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{SigningKey, VerifyingKey, KEYPAIR_LENGTH};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use subtle::ConstantTimeEq;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::encoding::{from_base32, to_base32};
use crate::crypto::encryption::SharedSecret;
use crate::crypto::kdf::derive_keys_from_seed;
use crate::crypto::signing::{self, Signature};
use crate::error::{Error, Result};

/// Size of a serialized [`KeyPair`] (seed ‖ public key)
pub const KEYPAIR_SIZE: usize = KEYPAIR_LENGTH;

/// An Ed25519 private key
#[derive(Clone, ZeroizeOnDrop)]
pub struct PrivateKey {
    #[zeroize(skip)] // ed25519_dalek::SigningKey handles its own zeroization
    secret: SigningKey,
}

impl PrivateKey {
    /// Generate a new random private key from the OS RNG
    pub fn random() -> Result<Self> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|_| Error::RngFailed)?;
        let key = Self::from_bytes(&seed);
        seed.zeroize();
        Ok(key)
    }

    /// Create from a raw 32-byte Ed25519 seed
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            secret: SigningKey::from_bytes(bytes),
        }
    }

    pub(crate) fn from_signing_key(secret: SigningKey) -> Self {
        Self { secret }
    }

    /// Get the secret key bytes (for backup/storage)
    ///
    /// ## Security Warning
    ///
    /// Only use this for secure storage. Never log or transmit these bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// Derive the matching public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.secret.verifying_key().to_bytes())
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        signing::sign(self, message)
    }

    /// Perform key agreement with another party's public key
    ///
    /// ## Errors
    ///
    /// `InvalidKey` if `their_public` is not a valid curve point, has small
    /// order, or yields an all-zero (non-contributory) result.
    pub fn shared_secret(&self, their_public: &PublicKey) -> Result<SharedSecret> {
        let their_public = their_public.to_x25519()?;

        let mut scalar = self.secret.to_scalar_bytes();
        let secret = StaticSecret::from(scalar);
        scalar.zeroize();

        let shared = secret.diffie_hellman(&their_public);
        if !shared.was_contributory() {
            return Err(Error::InvalidKey(
                "key agreement produced a non-contributory result".into(),
            ));
        }

        Ok(SharedSecret::from_bytes(shared.to_bytes()))
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.secret
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.secret
            .as_bytes()
            .ct_eq(other.secret.as_bytes())
            .into()
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// An Ed25519 public key
///
/// Holds the raw 32-byte encoding. Point validity is checked where it
/// matters: [`PublicKey::verify`] returns `false` and
/// [`KeyPair::shared_secret`] returns `InvalidKey` for unusable keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Create from a slice (must be exactly 32 bytes)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            Error::Decoding(format!("Public key must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Copy out the raw bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Decode the canonical base32 string form
    pub fn from_string(text: &str) -> Result<Self> {
        Self::from_bytes(&from_base32(text)?)
    }

    /// Verify a signature made by the matching private key
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        signing::verify(self, message, signature)
    }

    /// Check that this key is a usable, non-weak curve point
    pub fn validate(&self) -> Result<()> {
        self.to_x25519().map(|_| ())
    }

    pub(crate) fn to_x25519(&self) -> Result<X25519PublicKey> {
        let verifying_key = VerifyingKey::from_bytes(&self.0)
            .map_err(|e| Error::InvalidKey(format!("Invalid public key: {}", e)))?;

        if verifying_key.is_weak() {
            return Err(Error::InvalidKey("public key has small order".into()));
        }

        Ok(X25519PublicKey::from(verifying_key.to_montgomery().to_bytes()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_base32(&self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// An asymmetric identity: one private key and its public key
///
/// ## Security
///
/// - The private key is zeroized when this struct is dropped
/// - `Display` and `Debug` never render the private key
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Wrap a private key, deriving its public key
    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
        }
    }

    /// Generate a new random keypair
    ///
    /// Uses the operating system's secure random number generator.
    pub fn random() -> Result<Self> {
        Ok(Self::from_private_key(PrivateKey::random()?))
    }

    /// Create a keypair from a 32-byte seed
    ///
    /// Deterministic: the same seed always produces the same keys.
    ///
    /// ```text
    /// Seed (32 bytes) ──► HKDF(seed, "subfield-signing-key-v1") → Ed25519 key
    /// ```
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self> {
        let derived = derive_keys_from_seed(seed)?;
        Ok(Self::from_private_key(PrivateKey::from_bytes(
            &derived.signing_key,
        )))
    }

    pub(crate) fn from_signing_key(secret: SigningKey) -> Self {
        Self::from_private_key(PrivateKey::from_signing_key(secret))
    }

    /// The private half
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The public half
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Serialize as `seed (32) ‖ public key (32)`
    ///
    /// Contains the private key. Store it like one.
    pub fn to_bytes(&self) -> [u8; KEYPAIR_SIZE] {
        self.private_key.secret.to_keypair_bytes()
    }

    /// Deserialize output of [`KeyPair::to_bytes`]
    ///
    /// ## Errors
    ///
    /// `Decoding` if the input is not 64 bytes or the embedded public key
    /// does not belong to the embedded seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; KEYPAIR_SIZE] = bytes.try_into().map_err(|_| {
            Error::Decoding(format!(
                "Keypair must be {} bytes, got {}",
                KEYPAIR_SIZE,
                bytes.len()
            ))
        })?;

        let secret = SigningKey::from_keypair_bytes(bytes)
            .map_err(|_| Error::Decoding("public key does not match private key".into()))?;

        Ok(Self::from_signing_key(secret))
    }

    /// Encode the full keypair (including the secret) as base32
    pub fn to_secret_string(&self) -> String {
        let mut bytes = self.to_bytes();
        let text = to_base32(&bytes);
        bytes.zeroize();
        text
    }

    /// Decode output of [`KeyPair::to_secret_string`]
    pub fn from_secret_string(text: &str) -> Result<Self> {
        let mut bytes = from_base32(text)?;
        let keypair = Self::from_bytes(&bytes);
        bytes.zeroize();
        keypair
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.private_key.sign(message)
    }

    /// Verify a signature against this keypair's public key
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.public_key.verify(message, signature)
    }

    /// Perform key agreement with another party's public key
    ///
    /// Returns a shared secret that both parties can compute:
    /// - Alice: alice_private × bob_public
    /// - Bob: bob_private × alice_public
    pub fn shared_secret(&self, their_public: &PublicKey) -> Result<SharedSecret> {
        self.private_key.shared_secret(their_public)
    }
}

impl fmt::Display for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.public_key, f)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
