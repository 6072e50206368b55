//! # Noise Session Demo
//!
//! Demonstrates the three-step handshake and chunked transport encryption.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example noise_demo
//! ```

use subfield_core::noise::{ciphertext_len, CHUNK_SIZE};
use subfield_core::{KeyPair, NoiseBuilder};

fn main() {
    println!("=== Subfield Core: Noise Session Demo ===\n");

    // Step 1: Create both ends
    println!("Step 1: Creating initiator and responder...");

    let mut initiator = NoiseBuilder::initiator().prologue(b"noise-demo/1").build();
    let mut responder = NoiseBuilder::responder()
        .prologue(b"noise-demo/1")
        .payload(b"welcome")
        .build();

    println!("  Initiator phase: {:?}", initiator.phase());
    println!("  Responder phase: {:?}", responder.phase());
    println!();

    // Step 2: Handshake
    println!("Step 2: Running the handshake...");
    println!();
    println!("  Initiator                          Responder");
    println!("     │ ──────── msg1: e ─────────────► │");
    println!("     │ ◄─────── msg2: e, ee ────────── │");
    println!();

    let msg1 = initiator.handshake_step_1().expect("step 1 failed");
    println!("  msg1: {} bytes", msg1.len());

    let msg2 = responder.handshake_step_2(&msg1).expect("step 2 failed");
    println!("  msg2: {} bytes", msg2.len());

    initiator.handshake_step_3(&msg2).expect("step 3 failed");

    println!(
        "  Responder payload: \"{}\"",
        String::from_utf8_lossy(initiator.handshake_payload().unwrap_or_default())
    );
    println!("  Both in transport: {}", initiator.is_transport() && responder.is_transport());
    println!();

    // Step 3: Bind an identity to the channel
    println!("Step 3: Binding an identity to the channel...");

    let identity = KeyPair::random().expect("Failed to create keypair");
    let hash = initiator.handshake_hash().expect("no handshake hash");
    let binding = identity.sign(&hash);
    let peer_hash = responder.handshake_hash().expect("no handshake hash");
    println!(
        "  Responder verifies {}'s binding: {}",
        identity,
        identity.public_key().verify(&peer_hash, &binding)
    );
    println!();

    // Step 4: Transport in both directions
    println!("Step 4: Encrypting messages...");

    let ciphertext = initiator.encrypt(b"hello world!").expect("encrypt failed");
    let plaintext = responder.decrypt(&ciphertext).expect("decrypt failed");
    println!(
        "  initiator → responder: \"{}\" ({} bytes on the wire)",
        String::from_utf8_lossy(&plaintext),
        ciphertext.len()
    );

    let ciphertext = responder.encrypt(b"hello back").expect("encrypt failed");
    let plaintext = initiator.decrypt(&ciphertext).expect("decrypt failed");
    println!(
        "  responder → initiator: \"{}\" ({} bytes on the wire)",
        String::from_utf8_lossy(&plaintext),
        ciphertext.len()
    );
    println!();

    // Step 5: Large messages are chunked
    println!("Step 5: Sending 1 MiB...");

    let data = vec![b'a'; 1024 * 1024];
    let ciphertext = initiator.encrypt(&data).expect("encrypt failed");
    let decrypted = responder.decrypt(&ciphertext).expect("decrypt failed");

    println!("  Chunks of {} bytes: {}", CHUNK_SIZE, data.len() / CHUNK_SIZE);
    println!(
        "  Ciphertext: {} bytes (expected {})",
        ciphertext.len(),
        ciphertext_len(data.len())
    );
    println!("  Round trip intact: {}", decrypted == data);
    println!("  Initiator chunks sent: {}", initiator.sent_chunks());
    println!();

    println!("=== Example Complete ===");
}
