//! # Signing Demo
//!
//! Demonstrates Ed25519 signatures and public key strings.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example signing_demo
//! ```

use subfield_core::crypto::{KeyPair, PublicKey};

fn main() {
    println!("=== Subfield Core: Digital Signatures Demo ===\n");

    // Step 1: Create a keypair
    println!("Step 1: Creating a keypair...");

    let keypair = KeyPair::random().expect("Failed to create keypair");

    println!("  Public key: {}", keypair);
    println!("  String length: {} characters", keypair.to_string().len());
    println!();

    // Step 2: Share the public key as a string
    println!("Step 2: Sharing the public key...");

    let shared = keypair.public_key().to_string();
    let received = PublicKey::from_string(&shared).expect("Failed to parse public key");
    println!("  Parsed back: {}", received == *keypair.public_key());
    println!();

    // Step 3: Sign a message
    println!("Step 3: Signing a message...");

    let message = b"This message was sent by me and has not been tampered with.";
    println!("  Message: \"{}\"", String::from_utf8_lossy(message));

    let signature = keypair.sign(message);

    println!("  Signature (hex): {}", signature.to_hex());
    println!("  Signature length: {} bytes", signature.as_bytes().len());
    println!();

    // Step 4: Verify with the received public key
    println!("Step 4: Verifying the signature...");

    if received.verify(message, &signature) {
        println!("  [OK] Signature is valid!");
    } else {
        println!("  [FAILED] Signature verification failed!");
    }
    println!();

    // Step 5: Demonstrate forgery detection
    println!("Step 5: Forgery detection...");

    let tampered_message = b"This message was MODIFIED by an attacker!";
    if received.verify(tampered_message, &signature) {
        println!("  [FAILED] Tampered message was accepted!");
    } else {
        println!("  [OK] Tampered message detected - signature invalid!");
    }

    let wrong_keypair = KeyPair::from_seed(&[99u8; 32]).expect("Failed to create wrong keypair");
    if wrong_keypair.public_key().verify(message, &signature) {
        println!("  [FAILED] Wrong public key was accepted!");
    } else {
        println!("  [OK] Wrong public key detected - signature invalid!");
    }
    println!();

    // Step 6: Back up and restore the keypair
    println!("Step 6: Backing up the keypair...");

    let backup = keypair.to_secret_string();
    let restored = KeyPair::from_secret_string(&backup).expect("Failed to restore keypair");
    println!("  Backup length: {} characters", backup.len());
    println!("  Restored key matches: {}", restored == keypair);
    println!(
        "  Restored key signs identically: {}",
        restored.sign(message) == signature
    );
    println!();

    println!("=== Example Complete ===");
}
