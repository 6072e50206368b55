//! # Noise Secure Channel
//!
//! `Noise_NN_25519_ChaChaPoly_SHA256` (Noise Protocol Framework rev. 34)
//! with a chunked transport layer on top.
//!
//! ## Module Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          NOISE MODULE                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  session    NoiseSession, NoiseBuilder, Role, Phase                     │
//! │     │       (phase checks, copy-then-commit handshake steps)            │
//! │     ▼                                                                   │
//! │  handshake  NN message patterns: -> e / <- e, ee                        │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  state      CipherState (key + u64 counter), SymmetricState (ck, h)    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  transport  1024-byte chunks, one tag and one nonce per chunk           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let mut initiator = NoiseSession::initiator();
//! let mut responder = NoiseSession::responder();
//!
//! let msg1 = initiator.handshake_step_1()?;
//! let msg2 = responder.handshake_step_2(&msg1)?;
//! initiator.handshake_step_3(&msg2)?;
//!
//! let ciphertext = initiator.encrypt(b"hello world!")?;
//! assert_eq!(responder.decrypt(&ciphertext)?, b"hello world!");
//! ```

mod handshake;
mod session;
mod state;
mod transport;

pub use handshake::{DH_LEN, MESSAGE_1_LEN, MESSAGE_2_LEN, PROTOCOL_NAME};
pub use session::{NoiseBuilder, NoiseSession, Phase, Role};
pub use state::HASH_LEN;
pub use transport::{chunk_count, ciphertext_len, CHUNK_SIZE, FRAME_SIZE, TAG_SIZE};
