//! # Error Types
//!
//! Unified error handling for Subfield Core.
//!
//! ## Error Categories
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ERROR HIERARCHY                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error                                                                  │
//! │  ├── Lifecycle (100-199)  init-once core context, RNG probe             │
//! │  ├── Crypto    (300-399)  decoding, AEAD, keys, derivation              │
//! │  ├── Noise     (400-499)  handshake sequencing and transport counters   │
//! │  ├── Vanity    (500-599)  prefix validation and search termination      │
//! │  └── Internal  (900-999)  worker failures                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Signature and digest verification never produce an error: a mismatch is
//! an expected outcome and is reported as `false`.

use thiserror::Error;

/// Result type alias for Subfield Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Subfield Core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Core Lifecycle Errors (100-199)
    // ========================================================================

    /// Core has not been initialized
    #[error("Subfield Core has not been initialized. Call SubfieldCore::initialize() first.")]
    NotInitialized,

    /// Core has already been initialized
    #[error("Subfield Core has already been initialized.")]
    AlreadyInitialized,

    /// The operating system RNG could not produce bytes
    #[error("Random number generation failed")]
    RngFailed,

    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================

    /// Malformed or wrong-length input to a deserializer
    #[error("Decoding failed: {0}")]
    Decoding(String),

    /// Ciphertext is too short to contain the fixed overhead
    #[error("Malformed ciphertext: {0}")]
    Format(String),

    /// Authentication tag did not verify (tampered data or wrong key)
    #[error("Authentication failed: ciphertext was tampered with or the key is wrong")]
    Authentication,

    /// Public key is not usable for key agreement
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Key derivation failed
    #[error("Failed to derive keys: {0}")]
    KeyDerivationFailed(String),

    /// The AEAD backend refused to encrypt
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    // ========================================================================
    // Noise Errors (400-499)
    // ========================================================================

    /// A handshake or transport method was called out of sequence
    #[error("Protocol state error: {0}")]
    ProtocolState(String),

    /// A handshake message failed to parse or authenticate
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// The transport counter would wrap for this message
    #[error("Transport nonce space exhausted; start a new session")]
    NonceExhausted,

    // ========================================================================
    // Vanity Search Errors (500-599)
    // ========================================================================

    /// The requested prefix can never match a public key string
    #[error("Invalid vanity prefix: {0}")]
    InvalidVanityPrefix(String),

    /// The search was cancelled before a match was found
    #[error("Vanity search cancelled")]
    SearchCancelled,

    /// The caller-supplied attempt cap was reached without a match
    #[error("Vanity search gave up after {0} attempts")]
    SearchExhausted(u64),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Core lifecycle
    /// - 300-399: Crypto
    /// - 400-499: Noise
    /// - 500-599: Vanity search
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Core (100-199)
            Error::NotInitialized => 100,
            Error::AlreadyInitialized => 101,
            Error::RngFailed => 102,

            // Crypto (300-399)
            Error::Decoding(_) => 300,
            Error::Format(_) => 301,
            Error::Authentication => 302,
            Error::InvalidKey(_) => 303,
            Error::KeyDerivationFailed(_) => 304,
            Error::EncryptionFailed(_) => 305,

            // Noise (400-499)
            Error::ProtocolState(_) => 400,
            Error::Handshake(_) => 401,
            Error::NonceExhausted => 402,

            // Vanity (500-599)
            Error::InvalidVanityPrefix(_) => 500,
            Error::SearchCancelled => 501,
            Error::SearchExhausted(_) => 502,

            // Internal (900-999)
            Error::Internal(_) => 900,
        }
    }

    /// Whether the error indicates forged or corrupted input rather than a
    /// caller mistake
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Error::Authentication | Error::Handshake(_))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_categorized() {
        assert_eq!(Error::NotInitialized.code(), 100);
        assert_eq!(Error::Decoding("x".into()).code(), 300);
        assert_eq!(Error::Authentication.code(), 302);
        assert_eq!(Error::ProtocolState("x".into()).code(), 400);
        assert_eq!(Error::SearchCancelled.code(), 501);
        assert_eq!(Error::Internal("x".into()).code(), 900);
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidKey("not on curve".into());
        assert_eq!(err.to_string(), "Invalid key: not on curve");

        let err = Error::SearchExhausted(42);
        assert_eq!(err.to_string(), "Vanity search gave up after 42 attempts");
    }

    #[test]
    fn test_integrity_failures() {
        assert!(Error::Authentication.is_integrity_failure());
        assert!(Error::Handshake("bad tag".into()).is_integrity_failure());
        assert!(!Error::Format("short".into()).is_integrity_failure());
    }
}
