//! The NN handshake pattern
//!
//! ```text
//! NN:
//!   -> e
//!   <- e, ee
//! ```
//!
//! Neither side has a static key; the channel is confidential against
//! passive observers but not authenticated. Identities are bound afterwards,
//! e.g. by signing [`handshake_hash`](HandshakeState::handshake_hash).

use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroize;

use super::state::{CipherState, SymmetricState, HASH_LEN, TAG_LEN};
use crate::error::{Error, Result};

/// Full Noise protocol name; also the initial handshake hash
pub const PROTOCOL_NAME: &str = "Noise_NN_25519_ChaChaPoly_SHA256";

/// X25519 public key length
pub const DH_LEN: usize = 32;

/// Size of the first handshake message without payload
pub const MESSAGE_1_LEN: usize = DH_LEN;

/// Size of the second handshake message without payload
pub const MESSAGE_2_LEN: usize = DH_LEN + TAG_LEN;

#[derive(Clone)]
pub(crate) struct HandshakeState {
    symmetric: SymmetricState,
    e: Option<StaticSecret>,
    re: Option<X25519PublicKey>,
}

impl HandshakeState {
    pub(crate) fn new(prologue: &[u8]) -> Self {
        let mut symmetric = SymmetricState::initialize(PROTOCOL_NAME.as_bytes());
        symmetric.mix_hash(prologue);
        Self {
            symmetric,
            e: None,
            re: None,
        }
    }

    /// `-> e`
    pub(crate) fn write_message_1(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut message = self.write_e()?;
        message.extend(self.symmetric.encrypt_and_hash(payload)?);
        Ok(message)
    }

    /// Read `-> e`, returning the (plaintext) payload
    pub(crate) fn read_message_1(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        let rest = self.read_e(message)?;
        self.symmetric.decrypt_and_hash(rest)
    }

    /// `<- e, ee`
    pub(crate) fn write_message_2(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut message = self.write_e()?;
        self.mix_ee()?;
        message.extend(self.symmetric.encrypt_and_hash(payload)?);
        Ok(message)
    }

    /// Read `<- e, ee`, returning the decrypted payload
    pub(crate) fn read_message_2(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        if message.len() < MESSAGE_2_LEN {
            return Err(Error::Handshake(format!(
                "second message must be at least {} bytes, got {}",
                MESSAGE_2_LEN,
                message.len()
            )));
        }

        let rest = self.read_e(message)?;
        self.mix_ee()?;
        self.symmetric
            .decrypt_and_hash(rest)
            .map_err(|_| Error::Handshake("second message failed authentication".into()))
    }

    /// Transport states, initiator→responder first
    pub(crate) fn split(&self) -> Result<(CipherState, CipherState)> {
        if !self.symmetric.has_key() {
            return Err(Error::ProtocolState("handshake is not complete".into()));
        }
        self.symmetric.split()
    }

    pub(crate) fn handshake_hash(&self) -> [u8; HASH_LEN] {
        self.symmetric.handshake_hash()
    }

    fn write_e(&mut self) -> Result<Vec<u8>> {
        let mut bytes = [0u8; DH_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| Error::RngFailed)?;
        let e = StaticSecret::from(bytes);
        bytes.zeroize();

        let public = X25519PublicKey::from(&e);
        self.symmetric.mix_hash(public.as_bytes());
        self.e = Some(e);

        Ok(public.as_bytes().to_vec())
    }

    fn read_e<'m>(&mut self, message: &'m [u8]) -> Result<&'m [u8]> {
        if message.len() < DH_LEN {
            return Err(Error::Handshake(format!(
                "message must carry a {}-byte ephemeral key, got {} bytes",
                DH_LEN,
                message.len()
            )));
        }

        let (re, rest) = message.split_at(DH_LEN);
        let mut bytes = [0u8; DH_LEN];
        bytes.copy_from_slice(re);

        self.symmetric.mix_hash(&bytes);
        self.re = Some(X25519PublicKey::from(bytes));
        Ok(rest)
    }

    fn mix_ee(&mut self) -> Result<()> {
        let (Some(e), Some(re)) = (&self.e, &self.re) else {
            return Err(Error::ProtocolState("ee requires both ephemeral keys".into()));
        };

        let shared = e.diffie_hellman(re);
        if !shared.was_contributory() {
            return Err(Error::Handshake("remote ephemeral key has low order".into()));
        }

        self.symmetric.mix_key(shared.as_bytes())
    }
}
