//! # Vanity Key Search
//!
//! Brute-force search for a keypair whose public key string starts with a
//! chosen prefix.
//!
//! ## Search Loop
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         VANITY SEARCH                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   worker 0        worker 1        ...        worker N-1                 │
//! │   ────────        ────────                   ──────────                 │
//! │   random key      random key                 random key                 │
//! │   encode prefix   encode prefix              encode prefix              │
//! │   starts_with? ─┐ starts_with?               starts_with?               │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │        found.compare_exchange(false, true)                              │
//! │                 │                                                       │
//! │      won ──► publish keypair        lost ──► exit                       │
//! │                                                                         │
//! │   Every worker checks `found` and the cancel token between attempts.   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each extra prefix character multiplies the expected work by 32. Four
//! characters take about a million attempts; there is no built-in limit, so
//! callers that accept user input should set [`VanitySearch::max_attempts`]
//! or keep a [`CancelToken`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use ed25519_dalek::SigningKey;
use rand::rngs::{OsRng, StdRng};
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::crypto::encoding::{bytes_for_chars, encoded_len, is_alphabet_char, to_base32};
use crate::crypto::keys::{KeyPair, PublicKey};
use crate::crypto::PUBLIC_KEY_SIZE;
use crate::error::{Error, Result};
use crate::SubfieldCore;

/// Longest prefix a search will accept: the full public key string
pub const MAX_PREFIX_LEN: usize = 52;

/// Check that a prefix can ever match a public key string
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if let Some(bad) = prefix.chars().find(|c| !is_alphabet_char(*c)) {
        return Err(Error::InvalidVanityPrefix(format!(
            "'{}' is not a lowercase base32 character",
            bad
        )));
    }

    if prefix.len() > encoded_len(32) {
        return Err(Error::InvalidVanityPrefix(format!(
            "prefix is {} characters, public keys are {}",
            prefix.len(),
            MAX_PREFIX_LEN
        )));
    }

    Ok(())
}

/// Whether `public_key`'s string form starts with `prefix`
pub fn matches_prefix(public_key: &PublicKey, prefix: &str) -> bool {
    key_starts_with(public_key.as_bytes(), prefix)
}

/// Encode only as many key bytes as `prefix` can cover
fn key_starts_with(public: &[u8; PUBLIC_KEY_SIZE], prefix: &str) -> bool {
    let needed = bytes_for_chars(prefix.len()).min(PUBLIC_KEY_SIZE);
    to_base32(&public[..needed]).starts_with(prefix)
}

/// Shared stop flag for a running search
///
/// Cloning yields another handle to the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the "running" state
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every search holding this token to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether [`CancelToken::cancel`] has been called
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A successful search result
#[derive(Debug, Clone)]
pub struct VanityMatch {
    /// The matching keypair
    pub keypair: KeyPair,
    /// Keys generated across all workers, including the match
    pub attempts: u64,
}

/// Builder for a vanity search
///
/// ```ignore
/// let found = VanitySearch::new("aa")
///     .workers(4)
///     .max_attempts(1_000_000)
///     .run()?;
/// assert!(found.keypair.to_string().starts_with("aa"));
/// ```
#[derive(Debug, Clone)]
pub struct VanitySearch {
    prefix: String,
    workers: Option<usize>,
    max_attempts: Option<u64>,
    cancel: CancelToken,
}

impl VanitySearch {
    /// Start configuring a search for `prefix`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            workers: None,
            max_attempts: None,
            cancel: CancelToken::new(),
        }
    }

    /// Number of worker threads (at least one)
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    /// Give up after this many keys in total
    pub fn max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Stop when `token` is cancelled
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run the search on the calling thread, blocking until it ends
    ///
    /// ## Errors
    ///
    /// - `InvalidVanityPrefix` before any work if the prefix can never match
    /// - `SearchCancelled` if the cancel token fires first
    /// - `SearchExhausted` if `max_attempts` keys were tried without a match
    pub fn run(self) -> Result<VanityMatch> {
        validate_prefix(&self.prefix)?;

        let config = SubfieldCore::config();
        let workers = self
            .workers
            .unwrap_or_else(|| config.resolved_vanity_workers());

        info!(
            prefix = %self.prefix,
            workers,
            max_attempts = ?self.max_attempts,
            "Starting vanity search"
        );

        let found = AtomicBool::new(false);
        let attempts = AtomicU64::new(0);

        let outcomes: Vec<Result<Option<SigningKey>>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|id| {
                    let budget = self.max_attempts.map(|max| worker_share(max, workers, id));
                    let ctx = WorkerContext {
                        prefix: &self.prefix,
                        budget,
                        found: &found,
                        cancel: &self.cancel,
                        attempts: &attempts,
                        verbose: config.verbose_logging,
                    };
                    scope.spawn(move || search_worker(id, ctx))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(Error::Internal("vanity worker panicked".into())))
                })
                .collect()
        });

        let attempts = attempts.load(Ordering::Acquire);
        let mut failure = None;

        for outcome in outcomes {
            match outcome {
                Ok(Some(secret)) => {
                    let keypair = KeyPair::from_signing_key(secret);
                    info!(public_key = %keypair, attempts, "Vanity search succeeded");
                    return Ok(VanityMatch { keypair, attempts });
                }
                Ok(None) => {}
                Err(e) => failure = Some(e),
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        if self.cancel.is_cancelled() {
            info!(attempts, "Vanity search cancelled");
            return Err(Error::SearchCancelled);
        }

        info!(attempts, "Vanity search exhausted its attempt budget");
        Err(Error::SearchExhausted(attempts))
    }

    /// Run the search on tokio's blocking pool
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> Result<VanityHandle> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Internal(format!("no tokio runtime: {}", e)))?;

        let cancel = self.cancel.clone();
        let task = runtime.spawn_blocking(move || self.run());

        Ok(VanityHandle {
            cancel,
            task: Some(task),
        })
    }
}

/// A search running in the background
///
/// Dropping the handle, or a pending [`VanityHandle::join`] future, before
/// the search finishes cancels it.
#[derive(Debug)]
pub struct VanityHandle {
    cancel: CancelToken,
    task: Option<JoinHandle<Result<VanityMatch>>>,
}

impl VanityHandle {
    /// Ask the search to stop; `join` then returns `SearchCancelled`
    /// unless a match was already claimed
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that stops this search when cancelled
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for the search to finish
    ///
    /// The task stays owned by the handle while awaiting, so dropping this
    /// future early runs `Drop` and cancels the workers.
    pub async fn join(mut self) -> Result<VanityMatch> {
        let task = self
            .task
            .as_mut()
            .ok_or_else(|| Error::Internal("vanity search already joined".into()))?;

        let outcome = task.await;
        self.task = None;

        outcome.map_err(|e| Error::Internal(format!("vanity search task failed: {}", e)))?
    }
}

impl Drop for VanityHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.cancel.cancel();
        }
    }
}

impl KeyPair {
    /// Generate keypairs until one's string form starts with `prefix`
    ///
    /// Runs on the blocking pool with the configured worker count. Dropping
    /// the returned future stops the workers.
    pub async fn vanity(prefix: &str) -> Result<KeyPair> {
        Self::vanity_with_cancel(prefix, CancelToken::new()).await
    }

    /// [`KeyPair::vanity`] that also stops when `token` is cancelled
    pub async fn vanity_with_cancel(prefix: &str, token: CancelToken) -> Result<KeyPair> {
        validate_prefix(prefix)?;
        let found = VanitySearch::new(prefix)
            .cancel_token(token)
            .spawn()?
            .join()
            .await?;
        Ok(found.keypair)
    }
}

// ============================================================================
// WORKERS
// ============================================================================

struct WorkerContext<'a> {
    prefix: &'a str,
    budget: Option<u64>,
    found: &'a AtomicBool,
    cancel: &'a CancelToken,
    attempts: &'a AtomicU64,
    verbose: bool,
}

/// Split `max` attempts across `workers` as evenly as possible
fn worker_share(max: u64, workers: usize, id: usize) -> u64 {
    let workers = workers as u64;
    let id = id as u64;
    max / workers + u64::from(id < max % workers)
}

fn search_worker(id: usize, ctx: WorkerContext<'_>) -> Result<Option<SigningKey>> {
    let mut rng = StdRng::from_rng(OsRng).map_err(|_| Error::RngFailed)?;
    let mut tried: u64 = 0;

    let winner = loop {
        if ctx.found.load(Ordering::Acquire) || ctx.cancel.is_cancelled() {
            break None;
        }
        if ctx.budget.is_some_and(|budget| tried >= budget) {
            break None;
        }

        let candidate = SigningKey::generate(&mut rng);
        tried += 1;

        if !key_starts_with(&candidate.verifying_key().to_bytes(), ctx.prefix) {
            continue;
        }

        // Only one worker may publish a result
        if ctx
            .found
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            break Some(candidate);
        }
        break None;
    };

    ctx.attempts.fetch_add(tried, Ordering::AcqRel);
    if ctx.verbose {
        debug!(worker = id, tried, won = winner.is_some(), "Vanity worker exiting");
    }

    Ok(winner)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("").is_ok());
        assert!(validate_prefix("abc234").is_ok());
        assert!(validate_prefix(&"a".repeat(MAX_PREFIX_LEN)).is_ok());

        for bad in ["A", "a1", "a8", "a9", "a0", "hello!", "é"] {
            assert!(
                matches!(validate_prefix(bad), Err(Error::InvalidVanityPrefix(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(matches!(
            validate_prefix(&"a".repeat(MAX_PREFIX_LEN + 1)),
            Err(Error::InvalidVanityPrefix(_))
        ));
    }

    #[test]
    fn test_matches_prefix_agrees_with_full_string() {
        for _ in 0..32 {
            let keypair = KeyPair::random().unwrap();
            let text = keypair.public_key().to_string();

            for len in [0, 1, 2, 3, 7, 8, 13, 51, 52] {
                assert!(matches_prefix(keypair.public_key(), &text[..len]));
            }
        }
    }

    #[test]
    fn test_empty_prefix_matches_first_key() {
        let found = VanitySearch::new("").workers(1).run().unwrap();
        assert_eq!(found.attempts, 1);
    }

    #[test]
    fn test_search_single_char() {
        let found = VanitySearch::new("q").workers(2).run().unwrap();

        assert!(found.keypair.to_string().starts_with('q'));
        assert!(found.attempts >= 1);
    }

    #[test]
    fn test_search_rejects_invalid_prefix() {
        let result = VanitySearch::new("Hello").run();
        assert!(matches!(result, Err(Error::InvalidVanityPrefix(_))));
    }

    #[test]
    fn test_search_exhausted() {
        // 13 characters is 2^65 expected work; 100 keys will not match
        let result = VanitySearch::new("zzzzzzzzzzzzz")
            .workers(3)
            .max_attempts(100)
            .run();

        assert_eq!(result.unwrap_err(), Error::SearchExhausted(100));
    }

    #[test]
    fn test_search_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();

        let result = VanitySearch::new("zzzzzzzzzzzzz")
            .workers(2)
            .cancel_token(token)
            .run();

        assert_eq!(result.unwrap_err(), Error::SearchCancelled);
    }

    #[test]
    fn test_full_length_prefix_is_searchable() {
        let prefix = "a".repeat(MAX_PREFIX_LEN);

        let result = VanitySearch::new(prefix.as_str())
            .workers(1)
            .max_attempts(10)
            .run();
        assert_eq!(result.unwrap_err(), Error::SearchExhausted(10));

        let result = VanitySearch::new(prefix).workers(3).max_attempts(10).run();
        assert_eq!(result.unwrap_err(), Error::SearchExhausted(10));
    }

    #[test]
    fn test_worker_share_sums_to_max() {
        for (max, workers) in [(100u64, 3usize), (2, 8), (0, 4), (7, 7)] {
            let total: u64 = (0..workers).map(|id| worker_share(max, workers, id)).sum();
            assert_eq!(total, max);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_async_vanity() {
        let keypair = KeyPair::vanity("aa").await.unwrap();
        assert!(keypair.to_string().starts_with("aa"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_spawned_search_can_be_cancelled() {
        let handle = VanitySearch::new("zzzzzzzzzzzzz").workers(2).spawn().unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();

        assert_eq!(handle.join().await.unwrap_err(), Error::SearchCancelled);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_abandoned_join_cancels_search() {
        let handle = VanitySearch::new("zzzzzzzzzzzzz").workers(2).spawn().unwrap();
        let token = handle.cancel_token();

        let waited = tokio::time::timeout(Duration::from_millis(50), handle.join()).await;

        assert!(waited.is_err());
        assert!(token.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_abandoned_async_vanity_cancels_search() {
        let token = CancelToken::new();

        let waited = tokio::time::timeout(
            Duration::from_millis(50),
            KeyPair::vanity_with_cancel("zzzzzzzzzzzzz", token.clone()),
        )
        .await;

        assert!(waited.is_err());
        assert!(token.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_async_vanity_stops_on_token() {
        let token = CancelToken::new();
        token.cancel();

        let result = KeyPair::vanity_with_cancel("zzzzzzzzzzzzz", token).await;
        assert_eq!(result.unwrap_err(), Error::SearchCancelled);
    }
}
