//! Noise `CipherState` and `SymmetricState` (Noise rev. 34, §5.1 and §5.2)
//! for the ChaChaPoly/SHA256 suite.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::crypto::hkdf_pair;
use crate::error::{Error, Result};

/// Hash output length (SHA-256)
pub const HASH_LEN: usize = 32;

/// Symmetric key length (ChaCha20-Poly1305)
pub const KEY_LEN: usize = 32;

/// Poly1305 tag length
pub const TAG_LEN: usize = 16;

/// ChaChaPoly nonce: 32 bits of zeros followed by the little-endian counter
fn nonce_bytes(counter: u64) -> Nonce {
    let mut nonce = [0u8; 12];
    nonce[4..].copy_from_slice(&counter.to_le_bytes());
    *Nonce::from_slice(&nonce)
}

/// A key plus a message counter
///
/// Encryption with an empty state passes data through unchanged, as in the
/// first NN message.
#[derive(Clone)]
pub(crate) struct CipherState {
    aead: Option<ChaCha20Poly1305>,
    n: u64,
}

impl CipherState {
    pub(crate) fn empty() -> Self {
        Self { aead: None, n: 0 }
    }

    pub(crate) fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            aead: Some(ChaCha20Poly1305::new(key.into())),
            n: 0,
        }
    }

    pub(crate) fn has_key(&self) -> bool {
        self.aead.is_some()
    }

    /// Next nonce to be used
    pub(crate) fn nonce(&self) -> u64 {
        self.n
    }

    #[cfg(test)]
    pub(crate) fn set_nonce(&mut self, n: u64) {
        self.n = n;
    }

    /// Fail unless `count` more nonces are available
    ///
    /// Nonce `u64::MAX` is reserved for rekeying and is never used for data.
    pub(crate) fn reserve(&self, count: u64) -> Result<()> {
        match self.n.checked_add(count) {
            Some(_) => Ok(()),
            None => Err(Error::NonceExhausted),
        }
    }

    /// Move the counter past `count` nonces that were used with
    /// [`CipherState::seal`] / [`CipherState::open`]
    pub(crate) fn advance(&mut self, count: u64) {
        self.n += count;
    }

    /// Encrypt with an explicit nonce, leaving the counter alone
    pub(crate) fn seal(&self, n: u64, ad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let Some(aead) = &self.aead else {
            return Ok(plaintext.to_vec());
        };

        aead.encrypt(&nonce_bytes(n), Payload { msg: plaintext, aad: ad })
            .map_err(|e| Error::EncryptionFailed(e.to_string()))
    }

    /// Decrypt with an explicit nonce, leaving the counter alone
    pub(crate) fn open(&self, n: u64, ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let Some(aead) = &self.aead else {
            return Ok(ciphertext.to_vec());
        };

        aead.decrypt(&nonce_bytes(n), Payload { msg: ciphertext, aad: ad })
            .map_err(|_| Error::Authentication)
    }

    pub(crate) fn encrypt_with_ad(&mut self, ad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        if !self.has_key() {
            return Ok(plaintext.to_vec());
        }
        self.reserve(1)?;
        let ciphertext = self.seal(self.n, ad, plaintext)?;
        self.advance(1);
        Ok(ciphertext)
    }

    pub(crate) fn decrypt_with_ad(&mut self, ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if !self.has_key() {
            return Ok(ciphertext.to_vec());
        }
        self.reserve(1)?;
        let plaintext = self.open(self.n, ad, ciphertext)?;
        self.advance(1);
        Ok(plaintext)
    }

    /// `REKEY(k)`: the first 32 bytes of encrypting zeros under nonce
    /// `2^64 - 1`. The counter is unchanged.
    pub(crate) fn rekey(&mut self) -> Result<()> {
        let Some(aead) = &self.aead else {
            return Err(Error::ProtocolState("cannot rekey an empty cipher state".into()));
        };

        let mut block = aead
            .encrypt(&nonce_bytes(u64::MAX), Payload { msg: &[0u8; KEY_LEN], aad: &[] })
            .map_err(|e| Error::EncryptionFailed(e.to_string()))?;

        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&block[..KEY_LEN]);
        self.aead = Some(ChaCha20Poly1305::new((&key).into()));

        key.zeroize();
        block.zeroize();
        Ok(())
    }
}

/// Chaining key, handshake hash and the current handshake cipher
#[derive(Clone)]
pub(crate) struct SymmetricState {
    ck: [u8; HASH_LEN],
    h: [u8; HASH_LEN],
    cipher: CipherState,
}

impl SymmetricState {
    pub(crate) fn initialize(protocol_name: &[u8]) -> Self {
        let h: [u8; HASH_LEN] = if protocol_name.len() <= HASH_LEN {
            let mut h = [0u8; HASH_LEN];
            h[..protocol_name.len()].copy_from_slice(protocol_name);
            h
        } else {
            Sha256::digest(protocol_name).into()
        };

        Self {
            ck: h,
            h,
            cipher: CipherState::empty(),
        }
    }

    pub(crate) fn mix_key(&mut self, input_key_material: &[u8]) -> Result<()> {
        let (ck, mut temp_k) = hkdf_pair(&self.ck, input_key_material)?;
        self.ck = ck;
        self.cipher = CipherState::new(&temp_k);
        temp_k.zeroize();
        Ok(())
    }

    pub(crate) fn mix_hash(&mut self, data: &[u8]) {
        let mut hasher = Sha256::new();
        hasher.update(self.h);
        hasher.update(data);
        self.h = hasher.finalize().into();
    }

    pub(crate) fn encrypt_and_hash(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let ciphertext = self.cipher.encrypt_with_ad(&self.h, plaintext)?;
        self.mix_hash(&ciphertext);
        Ok(ciphertext)
    }

    pub(crate) fn decrypt_and_hash(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let plaintext = self.cipher.decrypt_with_ad(&self.h, ciphertext)?;
        self.mix_hash(ciphertext);
        Ok(plaintext)
    }

    /// Derive the two transport cipher states (initiator→responder first)
    pub(crate) fn split(&self) -> Result<(CipherState, CipherState)> {
        let (mut k1, mut k2) = hkdf_pair(&self.ck, &[])?;
        let states = (CipherState::new(&k1), CipherState::new(&k2));
        k1.zeroize();
        k2.zeroize();
        Ok(states)
    }

    pub(crate) fn handshake_hash(&self) -> [u8; HASH_LEN] {
        self.h
    }

    pub(crate) fn has_key(&self) -> bool {
        self.cipher.has_key()
    }
}

impl Drop for SymmetricState {
    fn drop(&mut self) {
        self.ck.zeroize();
    }
}
