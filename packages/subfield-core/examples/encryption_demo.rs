//! # Encryption Demo
//!
//! Demonstrates key agreement between two parties feeding a shared cipher.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example encryption_demo
//! ```

use subfield_core::crypto::{hash, hash_verify, Cipher, KeyPair, CIPHER_OVERHEAD};
use subfield_core::Error;

fn main() {
    println!("=== Subfield Core: Encryption Demo ===\n");

    // Step 1: Create two parties (Alice and Bob)
    println!("Step 1: Creating keypairs for Alice and Bob...");

    let alice = KeyPair::from_seed(&[1u8; 32]).expect("Failed to create Alice's keypair");
    let bob = KeyPair::from_seed(&[2u8; 32]).expect("Failed to create Bob's keypair");

    println!("  Alice: {}", alice);
    println!("  Bob:   {}", bob);
    println!();

    // Step 2: Both sides compute the same shared secret
    println!("Step 2: Deriving shared secret (X25519)...");

    let alice_secret = alice
        .shared_secret(bob.public_key())
        .expect("Alice failed key agreement");
    let bob_secret = bob
        .shared_secret(alice.public_key())
        .expect("Bob failed key agreement");

    println!("  Secrets match: {}", alice_secret == bob_secret);
    println!();

    // Step 3: Turn the shared secret into a cipher on each side
    println!("Step 3: Deriving cipher keys...");

    let context = b"demo-conversation";
    let alice_cipher = Cipher::new(alice_secret.derive_key(context).expect("derive failed"));
    let bob_cipher = Cipher::new(bob_secret.derive_key(context).expect("derive failed"));
    println!();

    // Step 4: Encrypt and decrypt
    println!("Step 4: Alice encrypts, Bob decrypts...");

    let plaintext = b"Meet at the usual place at 7pm";
    let ciphertext = alice_cipher.encrypt(plaintext).expect("Encryption failed");

    println!("  Plaintext:  {} bytes", plaintext.len());
    println!(
        "  Ciphertext: {} bytes (+{} overhead)",
        ciphertext.len(),
        CIPHER_OVERHEAD
    );

    let decrypted = bob_cipher.decrypt(&ciphertext).expect("Decryption failed");
    println!("  Decrypted:  \"{}\"", String::from_utf8_lossy(&decrypted));
    println!();

    // Step 5: Tampering is detected
    println!("Step 5: Tamper detection...");

    let mut tampered = ciphertext.clone();
    tampered[20] ^= 0xFF;
    match bob_cipher.decrypt(&tampered) {
        Err(Error::Authentication) => println!("  [OK] Tampered ciphertext rejected"),
        other => println!("  [FAILED] Unexpected result: {:?}", other),
    }

    match bob_cipher.decrypt(&ciphertext[..10]) {
        Err(Error::Format(reason)) => println!("  [OK] Truncated ciphertext rejected: {}", reason),
        other => println!("  [FAILED] Unexpected result: {:?}", other),
    }
    println!();

    // Step 6: Content hashing
    println!("Step 6: Content hashing...");

    let digest = hash(plaintext);
    println!("  SHA-256: {}", digest);
    println!("  Verifies: {}", hash_verify(plaintext, &digest));
    println!("  Verifies other data: {}", hash_verify(b"something else", &digest));
    println!();

    println!("=== Example Complete ===");
}
