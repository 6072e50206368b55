//! # Noise Session
//!
//! A two-party secure channel: a three-call handshake followed by chunked
//! transport encryption.
//!
//! ## Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SESSION LIFECYCLE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   Initiator                                 Responder                   │
//! │   ─────────                                 ─────────                   │
//! │   Start                                     AwaitingMessage1            │
//! │     │                                              │                    │
//! │     │ handshake_step_1() ──── msg1 (e) ─────────►  │                    │
//! │     ▼                                              │ handshake_step_2() │
//! │   AwaitingMessage2                                 ▼                    │
//! │     │            ◄──────── msg2 (e, ee) ──────  Transport               │
//! │     │ handshake_step_3()                                                │
//! │     ▼                                                                   │
//! │   Transport                                                             │
//! │                                                                         │
//! │   Transport: encrypt() / decrypt() in both directions                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every step checks role and phase first and fails with
//! `Error::ProtocolState` when called out of order. A step that fails on bad
//! input leaves the session exactly as it was, so a later valid message can
//! still complete the handshake.

use std::fmt;

use tracing::{debug, warn};

use super::handshake::HandshakeState;
use super::state::HASH_LEN;
use super::transport::TransportState;
use crate::error::{Error, Result};

/// Which side of the handshake a session plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Sends the first handshake message
    Initiator,
    /// Answers the first handshake message
    Responder,
}

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Initiator, before `handshake_step_1`
    Start,
    /// Responder, before `handshake_step_2`
    AwaitingMessage1,
    /// Initiator, between `handshake_step_1` and `handshake_step_3`
    AwaitingMessage2,
    /// Handshake complete; encrypt and decrypt are available
    Transport,
}

enum SessionState {
    Handshake(Box<HandshakeState>),
    Transport(TransportState),
}

/// Builder for a [`NoiseSession`]
///
/// ```ignore
/// let initiator = NoiseBuilder::initiator()
///     .prologue(b"subfield/1")
///     .payload(b"hello")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct NoiseBuilder {
    role: Role,
    prologue: Vec<u8>,
    payload: Vec<u8>,
}

impl NoiseBuilder {
    /// Start building an initiator session
    pub fn initiator() -> Self {
        Self::new(Role::Initiator)
    }

    /// Start building a responder session
    pub fn responder() -> Self {
        Self::new(Role::Responder)
    }

    fn new(role: Role) -> Self {
        Self {
            role,
            prologue: Vec::new(),
            payload: Vec::new(),
        }
    }

    /// Data both sides must agree on before the handshake (not transmitted)
    pub fn prologue(mut self, prologue: &[u8]) -> Self {
        self.prologue = prologue.to_vec();
        self
    }

    /// Payload carried in this side's handshake message
    ///
    /// The initiator's payload travels in the clear; the responder's is
    /// encrypted.
    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    /// Create the session
    pub fn build(self) -> NoiseSession {
        let phase = match self.role {
            Role::Initiator => Phase::Start,
            Role::Responder => Phase::AwaitingMessage1,
        };

        NoiseSession {
            role: self.role,
            phase,
            state: SessionState::Handshake(Box::new(HandshakeState::new(&self.prologue))),
            payload: self.payload,
            remote_payload: None,
        }
    }
}

/// A `Noise_NN_25519_ChaChaPoly_SHA256` session
///
/// Handshake steps take `&mut self`. Once in [`Phase::Transport`],
/// [`encrypt`](NoiseSession::encrypt) and [`decrypt`](NoiseSession::decrypt)
/// take `&self` and may be called from different threads at once.
pub struct NoiseSession {
    role: Role,
    phase: Phase,
    state: SessionState,
    payload: Vec<u8>,
    remote_payload: Option<Vec<u8>>,
}

impl NoiseSession {
    /// New initiator with no prologue or payload
    pub fn initiator() -> Self {
        NoiseBuilder::initiator().build()
    }

    /// New responder with no prologue or payload
    pub fn responder() -> Self {
        NoiseBuilder::responder().build()
    }

    /// This session's role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the handshake has completed
    pub fn is_transport(&self) -> bool {
        self.phase == Phase::Transport
    }

    // ========================================================================
    // HANDSHAKE
    // ========================================================================

    /// Initiator: produce the first handshake message
    pub fn handshake_step_1(&mut self) -> Result<Vec<u8>> {
        let mut handshake = self.checkout(Role::Initiator, Phase::Start, "handshake_step_1")?;

        let message = handshake.write_message_1(&self.payload)?;

        self.state = SessionState::Handshake(handshake);
        self.phase = Phase::AwaitingMessage2;
        debug!(len = message.len(), "Noise initiator sent message 1");

        Ok(message)
    }

    /// Responder: consume the first message, produce the second, and enter
    /// transport
    ///
    /// A message 1 arriving after the handshake completed is a replay and
    /// fails with `Handshake`; the transport state is untouched.
    pub fn handshake_step_2(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        if self.role == Role::Responder && self.phase == Phase::Transport {
            warn!(len = message.len(), "Noise responder got message 1 after the handshake");
            return Err(Error::Handshake(
                "message 1 replayed after the handshake completed".into(),
            ));
        }

        let mut handshake =
            self.checkout(Role::Responder, Phase::AwaitingMessage1, "handshake_step_2")?;

        let result = handshake.read_message_1(message).and_then(|remote_payload| {
            let reply = handshake.write_message_2(&self.payload)?;
            let (initiator_to_responder, responder_to_initiator) = handshake.split()?;
            let transport = TransportState::new(
                responder_to_initiator,
                initiator_to_responder,
                handshake.handshake_hash(),
            );
            Ok((remote_payload, reply, transport))
        });

        let (remote_payload, reply, transport) = result.map_err(|e| {
            warn!(error = %e, "Noise responder rejected message 1");
            e
        })?;

        self.enter_transport(transport, remote_payload);
        debug!(len = reply.len(), "Noise responder sent message 2, transport ready");

        Ok(reply)
    }

    /// Initiator: consume the second message and enter transport
    pub fn handshake_step_3(&mut self, message: &[u8]) -> Result<()> {
        let mut handshake =
            self.checkout(Role::Initiator, Phase::AwaitingMessage2, "handshake_step_3")?;

        let result = handshake.read_message_2(message).and_then(|remote_payload| {
            let (initiator_to_responder, responder_to_initiator) = handshake.split()?;
            let transport = TransportState::new(
                initiator_to_responder,
                responder_to_initiator,
                handshake.handshake_hash(),
            );
            Ok((remote_payload, transport))
        });

        let (remote_payload, transport) = result.map_err(|e| {
            warn!(error = %e, "Noise initiator rejected message 2");
            e
        })?;

        self.enter_transport(transport, remote_payload);
        debug!("Noise initiator received message 2, transport ready");

        Ok(())
    }

    /// Copy of the handshake state if `role` and `phase` match
    ///
    /// Steps mutate the copy and write it back only on success.
    fn checkout(&self, role: Role, phase: Phase, step: &str) -> Result<Box<HandshakeState>> {
        if self.role != role || self.phase != phase {
            return Err(Error::ProtocolState(format!(
                "{} is not valid for {:?} in phase {:?}",
                step, self.role, self.phase
            )));
        }

        match &self.state {
            SessionState::Handshake(handshake) => Ok(handshake.clone()),
            SessionState::Transport(_) => Err(Error::ProtocolState(format!(
                "{} called after the handshake completed",
                step
            ))),
        }
    }

    fn enter_transport(&mut self, transport: TransportState, remote_payload: Vec<u8>) {
        self.state = SessionState::Transport(transport);
        self.phase = Phase::Transport;
        self.remote_payload = Some(remote_payload);
        self.payload.clear();
    }

    fn transport(&self, operation: &str) -> Result<&TransportState> {
        match &self.state {
            SessionState::Transport(transport) => Ok(transport),
            SessionState::Handshake(_) => Err(Error::ProtocolState(format!(
                "{} requires a completed handshake (phase {:?})",
                operation, self.phase
            ))),
        }
    }

    // ========================================================================
    // TRANSPORT
    // ========================================================================

    /// Encrypt a message of any length for the peer
    ///
    /// Output length is `L + 16 × ceil(L / 1024)`; an empty message encrypts
    /// to nothing.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.transport("encrypt")?.encrypt(plaintext)
    }

    /// Decrypt a message produced by the peer's [`encrypt`](Self::encrypt)
    ///
    /// On any error the receive counter is unchanged.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.transport("decrypt")?.decrypt(ciphertext)
    }

    /// Replace the sending key (Noise §11.3)
    ///
    /// The peer must call [`rekey_incoming`](Self::rekey_incoming) at the
    /// same point in the message stream.
    pub fn rekey_outgoing(&self) -> Result<()> {
        self.transport("rekey_outgoing")?.rekey_outgoing()
    }

    /// Replace the receiving key to follow the peer's `rekey_outgoing`
    pub fn rekey_incoming(&self) -> Result<()> {
        self.transport("rekey_incoming")?.rekey_incoming()
    }

    /// Hash of the whole handshake transcript, identical on both sides
    ///
    /// Signing it with an identity key binds that identity to this channel.
    pub fn handshake_hash(&self) -> Result<[u8; HASH_LEN]> {
        Ok(self.transport("handshake_hash")?.handshake_hash())
    }

    /// The payload the peer attached to its handshake message
    pub fn handshake_payload(&self) -> Option<&[u8]> {
        self.remote_payload.as_deref()
    }

    /// Chunks encrypted so far (also the next sending nonce)
    pub fn sent_chunks(&self) -> u64 {
        match &self.state {
            SessionState::Transport(transport) => transport.sent_chunks(),
            SessionState::Handshake(_) => 0,
        }
    }

    /// Chunks decrypted so far (also the next receiving nonce)
    pub fn received_chunks(&self) -> u64 {
        match &self.state {
            SessionState::Transport(transport) => transport.received_chunks(),
            SessionState::Handshake(_) => 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn transport_state(&self) -> Option<&TransportState> {
        match &self.state {
            SessionState::Transport(transport) => Some(transport),
            SessionState::Handshake(_) => None,
        }
    }
}

impl fmt::Debug for NoiseSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoiseSession")
            .field("role", &self.role)
            .field("phase", &self.phase)
            .field("sent_chunks", &self.sent_chunks())
            .field("received_chunks", &self.received_chunks())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn connected() -> (NoiseSession, NoiseSession) {
        let mut initiator = NoiseSession::initiator();
        let mut responder = NoiseSession::responder();

        let msg1 = initiator.handshake_step_1().unwrap();
        let msg2 = responder.handshake_step_2(&msg1).unwrap();
        initiator.handshake_step_3(&msg2).unwrap();

        (initiator, responder)
    }

    #[test]
    fn test_initial_phases() {
        let initiator = NoiseSession::initiator();
        let responder = NoiseSession::responder();

        assert_eq!(initiator.role(), Role::Initiator);
        assert_eq!(initiator.phase(), Phase::Start);
        assert_eq!(responder.role(), Role::Responder);
        assert_eq!(responder.phase(), Phase::AwaitingMessage1);
        assert!(!initiator.is_transport());
    }

    #[test]
    fn test_full_handshake() {
        let (initiator, responder) = connected();

        assert!(initiator.is_transport());
        assert!(responder.is_transport());
        assert_eq!(
            initiator.handshake_hash().unwrap(),
            responder.handshake_hash().unwrap()
        );
    }

    #[test]
    fn test_hello_world_both_directions() {
        let (initiator, responder) = connected();

        let ct = initiator.encrypt(b"hello world!").unwrap();
        assert_eq!(ct.len(), 12 + 16);
        assert_eq!(responder.decrypt(&ct).unwrap(), b"hello world!");

        let ct = responder.encrypt(b"hello back").unwrap();
        assert_eq!(initiator.decrypt(&ct).unwrap(), b"hello back");
    }

    #[test]
    fn test_out_of_order_calls() {
        let mut initiator = NoiseSession::initiator();
        let mut responder = NoiseSession::responder();

        assert!(matches!(responder.handshake_step_1(), Err(Error::ProtocolState(_))));
        assert!(matches!(initiator.handshake_step_2(&[0u8; 32]), Err(Error::ProtocolState(_))));
        assert!(matches!(initiator.handshake_step_3(&[0u8; 48]), Err(Error::ProtocolState(_))));
        assert!(matches!(initiator.encrypt(b"x"), Err(Error::ProtocolState(_))));
        assert!(matches!(responder.decrypt(b"x"), Err(Error::ProtocolState(_))));
        assert!(matches!(initiator.handshake_hash(), Err(Error::ProtocolState(_))));

        let msg1 = initiator.handshake_step_1().unwrap();
        assert!(matches!(initiator.handshake_step_1(), Err(Error::ProtocolState(_))));

        let msg2 = responder.handshake_step_2(&msg1).unwrap();
        assert!(matches!(responder.handshake_step_3(&msg2), Err(Error::ProtocolState(_))));

        initiator.handshake_step_3(&msg2).unwrap();
        assert!(matches!(initiator.handshake_step_3(&msg2), Err(Error::ProtocolState(_))));
    }

    #[test]
    fn test_replayed_message_1_is_rejected() {
        let mut initiator = NoiseSession::initiator();
        let mut responder = NoiseSession::responder();
        let msg1 = initiator.handshake_step_1().unwrap();
        let msg2 = responder.handshake_step_2(&msg1).unwrap();
        initiator.handshake_step_3(&msg2).unwrap();

        assert!(matches!(responder.handshake_step_2(&msg1), Err(Error::Handshake(_))));
        assert_eq!(responder.phase(), Phase::Transport);

        let ct = initiator.encrypt(b"still connected").unwrap();
        assert_eq!(responder.decrypt(&ct).unwrap(), b"still connected");

        let fresh = NoiseSession::initiator().handshake_step_1().unwrap();
        assert!(matches!(responder.handshake_step_2(&fresh), Err(Error::Handshake(_))));
    }

    #[test]
    fn test_malformed_message_1_keeps_state() {
        let mut initiator = NoiseSession::initiator();
        let mut responder = NoiseSession::responder();

        assert!(matches!(responder.handshake_step_2(&[1u8; 10]), Err(Error::Handshake(_))));
        assert!(matches!(responder.handshake_step_2(&[0u8; 32]), Err(Error::Handshake(_))));
        assert_eq!(responder.phase(), Phase::AwaitingMessage1);

        let msg1 = initiator.handshake_step_1().unwrap();
        let msg2 = responder.handshake_step_2(&msg1).unwrap();
        initiator.handshake_step_3(&msg2).unwrap();
        assert!(responder.is_transport());
    }

    #[test]
    fn test_tampered_message_2_keeps_state() {
        let mut initiator = NoiseSession::initiator();
        let mut responder = NoiseSession::responder();

        let msg1 = initiator.handshake_step_1().unwrap();
        let msg2 = responder.handshake_step_2(&msg1).unwrap();

        let mut bad = msg2.clone();
        bad[40] ^= 1;
        assert!(matches!(initiator.handshake_step_3(&bad), Err(Error::Handshake(_))));
        assert!(matches!(initiator.handshake_step_3(&msg2[..20]), Err(Error::Handshake(_))));
        assert_eq!(initiator.phase(), Phase::AwaitingMessage2);

        initiator.handshake_step_3(&msg2).unwrap();
        let ct = initiator.encrypt(b"ok").unwrap();
        assert_eq!(responder.decrypt(&ct).unwrap(), b"ok");
    }

    #[test]
    fn test_builder_prologue_and_payloads() {
        let mut initiator = NoiseBuilder::initiator()
            .prologue(b"subfield/1")
            .payload(b"from initiator")
            .build();
        let mut responder = NoiseBuilder::responder()
            .prologue(b"subfield/1")
            .payload(b"from responder")
            .build();

        let msg1 = initiator.handshake_step_1().unwrap();
        let msg2 = responder.handshake_step_2(&msg1).unwrap();
        initiator.handshake_step_3(&msg2).unwrap();

        assert_eq!(responder.handshake_payload(), Some(&b"from initiator"[..]));
        assert_eq!(initiator.handshake_payload(), Some(&b"from responder"[..]));
    }

    #[test]
    fn test_prologue_mismatch_fails_at_step_3() {
        let mut initiator = NoiseBuilder::initiator().prologue(b"a").build();
        let mut responder = NoiseBuilder::responder().prologue(b"b").build();

        let msg1 = initiator.handshake_step_1().unwrap();
        let msg2 = responder.handshake_step_2(&msg1).unwrap();

        assert!(matches!(initiator.handshake_step_3(&msg2), Err(Error::Handshake(_))));
    }

    #[test]
    fn test_sessions_are_independent() {
        let (a1, b1) = connected();
        let (a2, _b2) = connected();

        assert_ne!(a1.handshake_hash().unwrap(), a2.handshake_hash().unwrap());

        let ct = a2.encrypt(b"wrong session").unwrap();
        assert_eq!(b1.decrypt(&ct), Err(Error::Authentication));
        assert_eq!(b1.decrypt(&a1.encrypt(b"right").unwrap()).unwrap(), b"right");
    }

    #[test]
    fn test_rekey() {
        let (initiator, responder) = connected();

        initiator.rekey_outgoing().unwrap();
        responder.rekey_incoming().unwrap();

        let ct = initiator.encrypt(b"fresh key").unwrap();
        assert_eq!(responder.decrypt(&ct).unwrap(), b"fresh key");

        // The other direction is untouched
        let ct = responder.encrypt(b"old key").unwrap();
        assert_eq!(initiator.decrypt(&ct).unwrap(), b"old key");
    }

    #[test]
    fn test_nonce_exhaustion_surfaces() {
        let (initiator, _responder) = connected();
        initiator.transport_state().unwrap().set_send_nonce(u64::MAX);

        assert_eq!(initiator.encrypt(b"x"), Err(Error::NonceExhausted));
        assert_eq!(initiator.sent_chunks(), u64::MAX);
    }

    #[test]
    fn test_encrypt_and_decrypt_concurrently_on_one_session() {
        let (initiator, responder) = connected();
        let initiator = Arc::new(initiator);

        let replies: Vec<Vec<u8>> = (0..50)
            .map(|i| responder.encrypt(format!("reply {i}").as_bytes()).unwrap())
            .collect();

        let sender = {
            let initiator = Arc::clone(&initiator);
            std::thread::spawn(move || {
                (0..50)
                    .map(|_| initiator.encrypt(&[7u8; 1500]).unwrap())
                    .collect::<Vec<_>>()
            })
        };

        let receiver = {
            let initiator = Arc::clone(&initiator);
            std::thread::spawn(move || {
                for (i, ct) in replies.iter().enumerate() {
                    let pt = initiator.decrypt(ct).unwrap();
                    assert_eq!(pt, format!("reply {i}").as_bytes());
                }
            })
        };

        let outbound = sender.join().unwrap();
        receiver.join().unwrap();

        for ct in outbound {
            assert_eq!(responder.decrypt(&ct).unwrap(), vec![7u8; 1500]);
        }
        assert_eq!(initiator.sent_chunks(), 100);
        assert_eq!(initiator.received_chunks(), 50);
        assert_eq!(responder.received_chunks(), 100);
    }

    #[test]
    fn test_session_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoiseSession>();
    }
}
