//! # Vanity Key Demo
//!
//! Demonstrates searching for a public key with a chosen prefix.
//!
//! ## Run
//!
//! ```bash
//! RUST_LOG=subfield_core=debug cargo run --example vanity_demo
//! ```

use std::time::Instant;

use subfield_core::crypto::{CancelToken, VanitySearch};
use subfield_core::{CoreConfig, Error, KeyPair, SubfieldCore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Subfield Core: Vanity Key Demo ===\n");

    SubfieldCore::initialize(CoreConfig {
        vanity_workers: None,
        verbose_logging: true,
    })
    .expect("Failed to initialize");

    println!(
        "Workers: {}\n",
        SubfieldCore::config().resolved_vanity_workers()
    );

    // Step 1: Short prefixes
    println!("Step 1: Searching for short prefixes...");

    for prefix in ["a", "sf", "sub"] {
        let started = Instant::now();
        let keypair = KeyPair::vanity(prefix).await.expect("search failed");
        println!(
            "  {:>4} → {} ({:?})",
            prefix,
            keypair,
            started.elapsed()
        );
    }
    println!();

    // Step 2: Attempt budgets
    println!("Step 2: Searching with an attempt budget...");

    match VanitySearch::new("zzzzzzzz").max_attempts(10_000).run() {
        Err(Error::SearchExhausted(attempts)) => {
            println!("  Gave up after {} attempts, as expected", attempts)
        }
        other => println!("  Unexpected result: {:?}", other.map(|m| m.keypair.to_string())),
    }
    println!();

    // Step 3: Cancellation
    println!("Step 3: Cancelling a long search...");

    let token = CancelToken::new();
    let handle = VanitySearch::new("zzzzzzzzzzzz")
        .cancel_token(token.clone())
        .spawn()
        .expect("Failed to spawn search");

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    token.cancel();

    match handle.join().await {
        Err(Error::SearchCancelled) => println!("  [OK] Search cancelled"),
        other => println!("  Unexpected result: {:?}", other.map(|m| m.attempts)),
    }
    println!();

    // Step 4: Invalid prefixes are rejected up front
    println!("Step 4: Invalid prefix...");

    match KeyPair::vanity("Hello!").await {
        Err(e) => println!("  [OK] {} (code {})", e, e.code()),
        Ok(_) => println!("  [FAILED] Invalid prefix accepted"),
    }
    println!();

    println!("=== Example Complete ===");
}
