//! # Cryptography Module
//!
//! This module provides the cryptographic primitives used by Subfield Core.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    IDENTITY KEYS                                │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Seed (OS RNG, or caller-supplied 32 bytes via HKDF)           │   │
//! │  │                          │                                      │   │
//! │  │                          ▼                                      │   │
//! │  │  ┌─────────────────────────────────────────────────────────┐   │   │
//! │  │  │              KeyPair (Ed25519)                           │   │   │
//! │  │  └─────────────────────────────────────────────────────────┘   │   │
//! │  │            ┌─────────────┴─────────────┐                       │   │
//! │  │            ▼                           ▼                       │   │
//! │  │  ┌─────────────────┐         ┌─────────────────┐              │   │
//! │  │  │  Signatures     │         │ Key Agreement   │              │   │
//! │  │  │  (Ed25519)      │         │ (X25519 on the  │              │   │
//! │  │  │                 │         │  Montgomery map)│              │   │
//! │  │  └─────────────────┘         └────────┬────────┘              │   │
//! │  │                                       ▼                        │   │
//! │  │                              SharedSecret ─► HKDF ─► Cipher    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 STANDALONE ENCRYPTION                           │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Cipher (AES-256-GCM)                                          │   │
//! │  │  • 256-bit key                                                 │   │
//! │  │  • 96-bit nonce (random per message, sent in front)            │   │
//! │  │  • 128-bit authentication tag                                  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 PUBLIC KEY STRINGS                              │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Lowercase RFC 4648 base32, no padding: 52 characters          │   │
//! │  │  Vanity search brute-forces keys whose string has a prefix     │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices
//!
//! | Algorithm | Purpose |
//! |-----------|---------|
//! | SHA-256 | Content hashing |
//! | Ed25519 | Signing, identity |
//! | X25519 | Key agreement |
//! | AES-256-GCM | Standalone encryption |
//! | HKDF-SHA256 | Key derivation |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: Secret keys are zeroized when dropped
//! 2. **Constant-Time Operations**: dalek for curve math, `subtle` for compares
//! 3. **Secure Random**: `rand::rngs::OsRng` for every key and nonce
//! 4. **No Key Reuse**: Unique nonces for every encryption operation

mod encoding;
mod encryption;
mod hash;
mod kdf;
mod keys;
mod signing;
mod vanity;

pub use encoding::{from_base32, to_base32, ALPHABET};
pub use encryption::{
    Cipher, Nonce, SharedSecret, SymmetricKey, CIPHER_OVERHEAD, KEY_SIZE, NONCE_SIZE, TAG_SIZE,
};
pub use hash::{hash, hash_concat, hash_verify, Digest, DIGEST_SIZE};
pub use kdf::{derive_cipher_key, derive_keys_from_seed, DerivedKeys};
pub use keys::{KeyPair, PrivateKey, PublicKey, KEYPAIR_SIZE};
pub use signing::{sign, verify, Signature, SIGNATURE_SIZE};
pub use vanity::{
    matches_prefix, validate_prefix, CancelToken, VanityHandle, VanityMatch, VanitySearch,
    MAX_PREFIX_LEN,
};

pub(crate) use kdf::hkdf_pair;

/// Size of public keys in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Length of a public key's string form
pub const PUBLIC_KEY_STRING_LEN: usize = encoding::encoded_len(PUBLIC_KEY_SIZE);
