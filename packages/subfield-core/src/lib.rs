//! # Subfield Core
//!
//! Cryptographic primitives and Noise secure channels for peer-to-peer
//! applications.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SUBFIELD CORE MODULES                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌───────────────────────────────────┐  ┌───────────────────────────┐  │
//! │  │              Crypto               │  │          Noise            │  │
//! │  │                                   │  │                           │  │
//! │  │ - SHA-256 hashing                 │  │ - NN handshake (3 calls)  │  │
//! │  │ - AES-256-GCM Cipher              │  │ - ChaChaPoly transport    │  │
//! │  │ - Ed25519 KeyPair / PublicKey     │  │ - 1024-byte chunks        │  │
//! │  │ - X25519 shared secrets           │  │ - per-direction counters  │  │
//! │  │ - Vanity key search               │  │                           │  │
//! │  └─────────────────┬─────────────────┘  └─────────────┬─────────────┘  │
//! │                    │                                  │                │
//! │                    └──────────────┬───────────────────┘                │
//! │                                   ▼                                     │
//! │                    ┌─────────────────────────────┐                     │
//! │                    │   Error / SubfieldCore      │                     │
//! │                    │   (codes, init-once config) │                     │
//! │                    └─────────────────────────────┘                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Hashing, symmetric encryption, keys, signatures, vanity search
//! - [`noise`] - Noise handshake and chunked transport encryption
//!
//! ## Size Reference
//!
//! | Item | Bytes |
//! |------|-------|
//! | Digest | 32 |
//! | Cipher overhead | 28 |
//! | Signature | 64 |
//! | Public key | 32 (52 base32 chars) |
//! | Serialized keypair | 64 |
//! | Noise message 1 / 2 | 32 / 48 |
//! | Noise overhead | 16 per 1024-byte chunk |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod crypto;
pub mod error;
pub mod noise;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use crypto::{Cipher, Digest, KeyPair, PublicKey, SharedSecret, Signature, VanitySearch};
pub use error::{Error, Result};
pub use noise::{NoiseBuilder, NoiseSession, Phase, Role};

// ============================================================================
// CORE INSTANCE
// ============================================================================

use once_cell::sync::OnceCell;
use rand::rngs::OsRng;
use rand::RngCore;

/// Global Subfield Core instance
static CORE_INSTANCE: OnceCell<SubfieldCore> = OnceCell::new();

/// Configuration for initializing Subfield Core
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreConfig {
    /// Worker threads for vanity search (available parallelism if None)
    pub vanity_workers: Option<usize>,
    /// Emit per-worker debug events during vanity search
    pub verbose_logging: bool,
}

impl CoreConfig {
    /// Worker count with the default applied
    pub fn resolved_vanity_workers(&self) -> usize {
        self.vanity_workers
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
            .max(1)
    }
}

/// Process-wide settings shared by every primitive
///
/// ## Lifecycle
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                      SUBFIELD CORE LIFECYCLE                            │
/// ├─────────────────────────────────────────────────────────────────────────┤
/// │                                                                         │
/// │  SubfieldCore::initialize(config)                                       │
/// │     ├──► probe the OS RNG once (RngFailed)                             │
/// │     └──► store config (AlreadyInitialized on a second call)            │
/// │                                                                         │
/// │  SubfieldCore::config()                                                 │
/// │     └──► stored config, or CoreConfig::default() if never initialized  │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// Initialization is optional: every primitive works with the defaults.
#[derive(Debug)]
pub struct SubfieldCore {
    config: CoreConfig,
}

impl SubfieldCore {
    /// Initialize Subfield Core with the given configuration
    ///
    /// This should be called at most once, at application startup.
    ///
    /// ## Example
    ///
    /// ```ignore
    /// use subfield_core::{CoreConfig, SubfieldCore};
    ///
    /// SubfieldCore::initialize(CoreConfig {
    ///     vanity_workers: Some(4),
    ///     ..Default::default()
    /// })?;
    /// ```
    pub fn initialize(config: CoreConfig) -> Result<()> {
        tracing::info!("Initializing Subfield Core v{}", env!("CARGO_PKG_VERSION"));

        if Self::is_initialized() {
            return Err(Error::AlreadyInitialized);
        }

        let mut probe = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut probe)
            .map_err(|_| Error::RngFailed)?;

        CORE_INSTANCE
            .set(SubfieldCore { config })
            .map_err(|_| Error::AlreadyInitialized)?;

        tracing::info!("Subfield Core initialized successfully");
        Ok(())
    }

    /// Get the global core instance
    ///
    /// Returns an error if the core hasn't been initialized.
    pub fn instance() -> Result<&'static SubfieldCore> {
        CORE_INSTANCE.get().ok_or(Error::NotInitialized)
    }

    /// Check if the core is initialized
    pub fn is_initialized() -> bool {
        CORE_INSTANCE.get().is_some()
    }

    /// The active configuration
    pub fn config() -> CoreConfig {
        CORE_INSTANCE
            .get()
            .map(|core| core.config.clone())
            .unwrap_or_default()
    }

    /// The configuration this instance was initialized with
    pub fn settings(&self) -> &CoreConfig {
        &self.config
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Subfield Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns build information for debugging
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        #[cfg(target_os = "macos")]
        target: "macos",
        #[cfg(target_os = "linux")]
        target: "linux",
        #[cfg(target_os = "windows")]
        target: "windows",
        #[cfg(target_arch = "wasm32")]
        target: "wasm32",
        #[cfg(not(any(
            target_os = "macos",
            target_os = "linux",
            target_os = "windows",
            target_arch = "wasm32"
        )))]
        target: "unknown",
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
        protocol: noise::PROTOCOL_NAME,
    }
}

/// Build information for debugging
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Target operating system
    pub target: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
    /// Noise protocol name used by [`NoiseSession`]
    pub protocol: &'static str,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_build_info() {
        let info = build_info();
        assert_eq!(info.version, version());
        assert_eq!(info.protocol, "Noise_NN_25519_ChaChaPoly_SHA256");
    }

    #[test]
    fn test_resolved_vanity_workers() {
        let config = CoreConfig {
            vanity_workers: Some(3),
            ..Default::default()
        };
        assert_eq!(config.resolved_vanity_workers(), 3);

        let config = CoreConfig {
            vanity_workers: Some(0),
            ..Default::default()
        };
        assert_eq!(config.resolved_vanity_workers(), 1);

        assert!(CoreConfig::default().resolved_vanity_workers() >= 1);
    }
}
