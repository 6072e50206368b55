//! # Transport Framing
//!
//! Messages of any length are cut into chunks and each chunk is sealed with
//! the next counter nonce of its direction.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TRANSPORT MESSAGE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  plaintext (L bytes)                                                    │
//! │  ┌──────────────┬──────────────┬──────────────┬─────────┐              │
//! │  │   1024       │   1024       │   1024       │  rest   │              │
//! │  └──────┬───────┴──────┬───────┴──────┬───────┴────┬────┘              │
//! │         ▼              ▼              ▼            ▼                   │
//! │  ┌──────────┬───┬──────────┬───┬──────────┬───┬──────┬───┐            │
//! │  │  ct      │tag│  ct      │tag│  ct      │tag│  ct  │tag│            │
//! │  └──────────┴───┴──────────┴───┴──────────┴───┴──────┴───┘            │
//! │    nonce n       nonce n+1      nonce n+2      nonce n+3               │
//! │                                                                         │
//! │  length = L + 16 × ceil(L / 1024)                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no length prefix or message boundary marker: the caller's
//! framing delivers whole messages.

use parking_lot::Mutex;
use tracing::warn;

use super::state::{CipherState, HASH_LEN, TAG_LEN};
use crate::error::{Error, Result};

/// Plaintext bytes per chunk
pub const CHUNK_SIZE: usize = 1024;

/// Authentication tag bytes per chunk
pub const TAG_SIZE: usize = TAG_LEN;

/// Bytes per full ciphertext frame
pub const FRAME_SIZE: usize = CHUNK_SIZE + TAG_SIZE;

/// Number of chunks a plaintext of `len` bytes is cut into
pub const fn chunk_count(len: usize) -> usize {
    len.div_ceil(CHUNK_SIZE)
}

/// Ciphertext length for a plaintext of `len` bytes
pub const fn ciphertext_len(len: usize) -> usize {
    len + TAG_SIZE * chunk_count(len)
}

/// The two directional cipher states of an established session
///
/// Each direction has its own lock, so one thread may encrypt while another
/// decrypts. A message holds its direction's lock from first to last chunk,
/// keeping its nonces contiguous.
pub(crate) struct TransportState {
    send: Mutex<CipherState>,
    recv: Mutex<CipherState>,
    handshake_hash: [u8; HASH_LEN],
}

impl TransportState {
    pub(crate) fn new(send: CipherState, recv: CipherState, handshake_hash: [u8; HASH_LEN]) -> Self {
        Self {
            send: Mutex::new(send),
            recv: Mutex::new(recv),
            handshake_hash,
        }
    }

    pub(crate) fn handshake_hash(&self) -> [u8; HASH_LEN] {
        self.handshake_hash
    }

    pub(crate) fn sent_chunks(&self) -> u64 {
        self.send.lock().nonce()
    }

    pub(crate) fn received_chunks(&self) -> u64 {
        self.recv.lock().nonce()
    }

    pub(crate) fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        if plaintext.is_empty() {
            return Ok(Vec::new());
        }

        let chunks = chunk_count(plaintext.len()) as u64;
        let mut send = self.send.lock();
        send.reserve(chunks)?;

        let start = send.nonce();
        let mut output = Vec::with_capacity(ciphertext_len(plaintext.len()));

        for (i, chunk) in plaintext.chunks(CHUNK_SIZE).enumerate() {
            output.extend(send.seal(start + i as u64, &[], chunk)?);
        }

        send.advance(chunks);
        Ok(output)
    }

    pub(crate) fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.is_empty() {
            return Ok(Vec::new());
        }

        let frames = ciphertext.len().div_ceil(FRAME_SIZE);
        let last = ciphertext.len() - (frames - 1) * FRAME_SIZE;
        if last < TAG_SIZE {
            return Err(Error::Format(format!(
                "trailing frame is {} bytes, shorter than its {}-byte tag",
                last, TAG_SIZE
            )));
        }

        let mut recv = self.recv.lock();
        recv.reserve(frames as u64)?;

        let start = recv.nonce();
        let mut output = Vec::with_capacity(ciphertext.len() - frames * TAG_SIZE);

        for (i, frame) in ciphertext.chunks(FRAME_SIZE).enumerate() {
            let nonce = start + i as u64;
            let chunk = recv.open(nonce, &[], frame).map_err(|e| {
                warn!(frame = i, nonce, "Transport frame failed authentication");
                e
            })?;
            output.extend(chunk);
        }

        recv.advance(frames as u64);
        Ok(output)
    }

    pub(crate) fn rekey_outgoing(&self) -> Result<()> {
        self.send.lock().rekey()
    }

    pub(crate) fn rekey_incoming(&self) -> Result<()> {
        self.recv.lock().rekey()
    }

    #[cfg(test)]
    pub(crate) fn set_send_nonce(&self, n: u64) {
        self.send.lock().set_nonce(n);
    }

    #[cfg(test)]
    pub(crate) fn set_recv_nonce(&self, n: u64) {
        self.recv.lock().set_nonce(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A linked pair as produced by a completed handshake
    fn pair() -> (TransportState, TransportState) {
        let k1 = [1u8; 32];
        let k2 = [2u8; 32];
        let hash = [9u8; HASH_LEN];
        (
            TransportState::new(CipherState::new(&k1), CipherState::new(&k2), hash),
            TransportState::new(CipherState::new(&k2), CipherState::new(&k1), hash),
        )
    }

    #[test]
    fn test_length_formula() {
        assert_eq!(ciphertext_len(0), 0);
        assert_eq!(ciphertext_len(1), 17);
        assert_eq!(ciphertext_len(12), 28);
        assert_eq!(ciphertext_len(1024), 1040);
        assert_eq!(ciphertext_len(1025), 1025 + 32);
        assert_eq!(ciphertext_len(1024 * 1024), 1024 * 1024 + 16 * 1024);
    }

    #[test]
    fn test_round_trip_chunk_boundaries() {
        let (a, b) = pair();

        for len in [1usize, 1023, 1024, 1025, 2048, 3000] {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let ct = a.encrypt(&data).unwrap();
            assert_eq!(ct.len(), ciphertext_len(len));
            assert_eq!(b.decrypt(&ct).unwrap(), data);
        }
    }

    #[test]
    fn test_counters_advance_per_chunk() {
        let (a, b) = pair();

        b.decrypt(&a.encrypt(&[0u8; 2049]).unwrap()).unwrap();
        assert_eq!(a.sent_chunks(), 3);
        assert_eq!(b.received_chunks(), 3);
        assert_eq!(a.received_chunks(), 0);
    }

    #[test]
    fn test_empty_message() {
        let (a, b) = pair();

        assert!(a.encrypt(&[]).unwrap().is_empty());
        assert!(b.decrypt(&[]).unwrap().is_empty());
        assert_eq!(a.sent_chunks(), 0);
    }

    #[test]
    fn test_short_trailing_frame() {
        let (a, b) = pair();
        let ct = a.encrypt(&[5u8; 1030]).unwrap();

        let truncated = &ct[..FRAME_SIZE + 10];
        assert!(matches!(b.decrypt(truncated), Err(Error::Format(_))));
        assert!(matches!(b.decrypt(&ct[..3]), Err(Error::Format(_))));
        assert_eq!(b.received_chunks(), 0);
        assert_eq!(b.decrypt(&ct).unwrap(), vec![5u8; 1030]);
    }

    #[test]
    fn test_tampered_frame_is_atomic() {
        let (a, b) = pair();
        let mut ct = a.encrypt(&[1u8; 2500]).unwrap();
        let original = ct.clone();

        ct[FRAME_SIZE + 3] ^= 0x40;
        assert_eq!(b.decrypt(&ct), Err(Error::Authentication));
        assert_eq!(b.received_chunks(), 0);

        assert_eq!(b.decrypt(&original).unwrap(), vec![1u8; 2500]);
        assert_eq!(b.received_chunks(), 3);
    }

    #[test]
    fn test_replay_fails() {
        let (a, b) = pair();
        let ct = a.encrypt(b"once").unwrap();

        b.decrypt(&ct).unwrap();
        assert_eq!(b.decrypt(&ct), Err(Error::Authentication));
    }

    #[test]
    fn test_nonce_exhaustion() {
        let (a, b) = pair();
        a.set_send_nonce(u64::MAX - 2);
        b.set_recv_nonce(u64::MAX - 2);

        // Two chunks fit below the reserved nonce, three do not
        assert_eq!(a.encrypt(&[0u8; 3000]), Err(Error::NonceExhausted));
        assert_eq!(a.sent_chunks(), u64::MAX - 2);

        let ct = a.encrypt(&[0u8; 2000]).unwrap();
        assert_eq!(b.decrypt(&ct).unwrap(), vec![0u8; 2000]);
        assert_eq!(a.encrypt(b"x"), Err(Error::NonceExhausted));
    }

    #[test]
    fn test_rekey_both_sides() {
        let (a, b) = pair();

        a.rekey_outgoing().unwrap();
        let ct = a.encrypt(b"after").unwrap();
        assert_eq!(b.decrypt(&ct), Err(Error::Authentication));

        b.rekey_incoming().unwrap();
        assert_eq!(b.decrypt(&ct).unwrap(), b"after");
    }
}
