//! Vanity search through the public API, including the async entry point.

use subfield_core::crypto::{matches_prefix, CancelToken, KeyPair, VanitySearch, ALPHABET};
use subfield_core::Error;

#[test]
fn test_prefixes_up_to_three_chars() {
    for prefix in ["a", "7z", "sub"] {
        let found = VanitySearch::new(prefix).run().unwrap();

        assert!(found.keypair.to_string().starts_with(prefix));
        assert!(matches_prefix(found.keypair.public_key(), prefix));
        assert!(found.attempts >= 1);
    }
}

#[test]
fn test_found_key_is_a_working_keypair() {
    let found = VanitySearch::new("ab").workers(2).run().unwrap();
    let keypair = found.keypair;

    let signature = keypair.sign(b"vanity");
    assert!(keypair.public_key().verify(b"vanity", &signature));

    let restored = KeyPair::from_bytes(&keypair.to_bytes()).unwrap();
    assert_eq!(restored.to_string(), keypair.to_string());
}

#[test]
fn test_every_alphabet_character_is_a_valid_prefix() {
    for c in ALPHABET.chars() {
        let found = VanitySearch::new(c.to_string()).workers(1).run().unwrap();
        assert!(found.keypair.to_string().starts_with(c));
    }
}

#[test]
fn test_invalid_prefixes() {
    for prefix in ["0", "1", "8", "9", "Aa", "a b", "-"] {
        assert!(matches!(
            VanitySearch::new(prefix).max_attempts(10).run(),
            Err(Error::InvalidVanityPrefix(_))
        ));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_vanity_two_chars() {
    let keypair = KeyPair::vanity("zz").await.unwrap();
    assert!(keypair.to_string().starts_with("zz"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_vanity_rejects_bad_prefix() {
    assert!(matches!(
        KeyPair::vanity("Hello").await,
        Err(Error::InvalidVanityPrefix(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_external_cancel_token() {
    let token = CancelToken::new();
    let handle = VanitySearch::new("aaaaaaaaaaaaaaaa")
        .workers(2)
        .cancel_token(token.clone())
        .spawn()
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    token.cancel();

    assert_eq!(handle.join().await.unwrap_err(), Error::SearchCancelled);
    assert!(token.is_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropping_handle_cancels_search() {
    let token = CancelToken::new();
    let handle = VanitySearch::new("aaaaaaaaaaaaaaaa")
        .workers(1)
        .cancel_token(token.clone())
        .spawn()
        .unwrap();

    drop(handle);
    assert!(token.is_cancelled());
}

#[test]
fn test_spawn_outside_runtime_is_an_error() {
    assert!(matches!(
        VanitySearch::new("a").spawn(),
        Err(Error::Internal(_))
    ));
}
