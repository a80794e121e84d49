//! Thread-safe response cache with a background sweep task
//!
//! Provides a `ResponseCache` that maps request URLs to raw response bodies.
//! A sweep task spawned at construction deletes entries once they reach the
//! TTL, and stops on its own when the cache is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::debug;

use super::ExpiryPolicy;

/// A cached response body and the moment it was stored
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    created_at: Instant,
}

/// State shared between the cache handle and its sweep task
#[derive(Debug)]
struct Shared {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    policy: ExpiryPolicy,
}

impl Shared {
    /// Deletes every stale entry and returns how many were removed
    fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            !self
                .policy
                .is_stale(now.duration_since(entry.created_at), self.ttl)
        });
        before - entries.len()
    }
}

/// Concurrent key/value store whose entries expire after a fixed TTL
///
/// All reads and writes go through a single exclusive lock. Expired entries are
/// deleted by a sweep that runs every `ttl`; with the default
/// [`ExpiryPolicy::SweepOnly`] a lookup can therefore return an entry that is
/// up to one sweep interval past its TTL.
///
/// The cache is meant to be created once and shared behind an `Arc`.
#[derive(Debug)]
pub struct ResponseCache {
    shared: Arc<Shared>,
    /// Dropped together with the cache, which ends the sweep task
    _shutdown_tx: mpsc::Sender<()>,
}

impl ResponseCache {
    /// Creates an empty cache with the default sweep-only policy
    ///
    /// # Arguments
    /// * `ttl` - Entry lifetime and sweep period; must be non-zero
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime or if `ttl` is zero.
    pub fn new(ttl: Duration) -> Self {
        Self::with_policy(ttl, ExpiryPolicy::default())
    }

    /// Creates an empty cache that applies `policy` to lookups and sweeps
    pub fn with_policy(ttl: Duration, policy: ExpiryPolicy) -> Self {
        let shared = Arc::new(Shared {
            entries: Mutex::new(HashMap::new()),
            ttl,
            policy,
        });
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        spawn_sweeper(Arc::clone(&shared), shutdown_rx);

        Self {
            shared,
            _shutdown_tx: shutdown_tx,
        }
    }

    /// Inserts or overwrites the entry for `key`, stamped with the current time
    pub fn add(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let entry = CacheEntry {
            value: value.into(),
            created_at: Instant::now(),
        };
        self.shared.entries.lock().insert(key.into(), entry);
    }

    /// Returns a copy of the value stored under `key`, if any
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.shared.entries.lock();
        let entry = entries.get(key)?;
        if self
            .shared
            .policy
            .hides_on_read(entry.created_at.elapsed(), self.shared.ttl)
        {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Number of entries currently held, including any not yet swept
    pub fn len(&self) -> usize {
        self.shared.entries.lock().len()
    }

    /// Returns true if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.shared.ttl
    }
}

/// Spawns the periodic sweep; it exits once every shutdown sender is gone
///
/// A period too long for the clock to represent means no sweep is ever due,
/// so no task is spawned.
fn spawn_sweeper(shared: Arc<Shared>, mut shutdown_rx: mpsc::Receiver<()>) {
    let period = shared.ttl;
    let Some(first_sweep) = Instant::now().checked_add(period) else {
        debug!(?period, "cache TTL beyond the clock range, sweeper not started");
        return;
    };
    let mut interval = time::interval_at(first_sweep, period);

    tokio::spawn(async move {
        debug!(?period, "cache sweeper started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = shared.sweep();
                    if removed > 0 {
                        debug!(removed, "swept expired cache entries");
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!("cache sweeper stopped");
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const TTL: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_get_returns_value_after_add() {
        let cache = ResponseCache::new(TTL);
        cache.add("k", "v");

        assert_eq!(cache.get("k"), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_get_returns_none_for_missing_key() {
        let cache = ResponseCache::new(TTL);

        assert_eq!(cache.get("never-added"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_add_overwrites_existing_entry() {
        let cache = ResponseCache::new(TTL);
        cache.add("k", "first");
        cache.add("k", "second");

        assert_eq!(cache.get("k"), Some(b"second".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_value_is_still_a_hit() {
        let cache = ResponseCache::new(TTL);
        cache.add("empty", Vec::<u8>::new());

        assert_eq!(cache.get("empty"), Some(Vec::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_survives_until_just_before_ttl() {
        let cache = ResponseCache::new(TTL);
        cache.add("k", "v");

        time::sleep(TTL - Duration::from_millis(1)).await;

        assert_eq!(cache.get("k"), Some(b"v".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_is_swept_after_one_and_a_half_ttl() {
        let cache = ResponseCache::new(TTL);
        cache.add("k", "v");
        assert_eq!(cache.get("k"), Some(b"v".to_vec()));

        time::sleep(TTL + TTL / 2).await;

        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_is_gone_after_ttl_plus_sweep_period() {
        let cache = ResponseCache::new(TTL);
        time::sleep(Duration::from_secs(3)).await;
        cache.add("k", "v");

        time::sleep(TTL + TTL).await;

        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_only_returns_stale_entry_between_sweeps() {
        let cache = ResponseCache::new(TTL);
        time::sleep(TTL / 2).await;
        cache.add("k", "v");

        // First sweep at TTL sees an entry aged TTL/2 and keeps it; by now it
        // is past its TTL but the next sweep has not run yet.
        time::sleep(TTL + Duration::from_millis(500)).await;

        assert_eq!(cache.get("k"), Some(b"v".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_on_read_hides_stale_entry_between_sweeps() {
        let cache = ResponseCache::with_policy(TTL, ExpiryPolicy::CheckOnRead);
        time::sleep(TTL / 2).await;
        cache.add("k", "v");

        time::sleep(TTL + Duration::from_millis(500)).await;

        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 1, "entry is hidden, not yet deleted");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_fresh_entries() {
        let cache = ResponseCache::new(TTL);
        cache.add("old", "1");
        time::sleep(TTL / 2).await;
        cache.add("new", "2");

        time::sleep(TTL / 2 + Duration::from_millis(1)).await;

        assert_eq!(cache.get("old"), None);
        assert_eq!(cache.get("new"), Some(b"2".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_cache_stops_sweeper() {
        let cache = ResponseCache::new(TTL);
        let shared = Arc::clone(&cache.shared);
        assert_eq!(Arc::strong_count(&shared), 3);

        drop(cache);
        time::sleep(Duration::from_millis(1)).await;

        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[tokio::test]
    async fn test_ttl_beyond_clock_range_keeps_entries() {
        let cache = ResponseCache::new(Duration::from_secs(u64::MAX));
        cache.add("key", "value");

        assert_eq!(cache.ttl(), Duration::from_secs(u64::MAX));
        assert_eq!(Arc::strong_count(&cache.shared), 1);
        assert_eq!(cache.get("key"), Some(b"value".to_vec()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_add_and_get_do_not_lose_updates() {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
        let threads = 8;
        let keys_per_thread = 200;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for k in 0..keys_per_thread {
                        let key = format!("thread-{t}-key-{k}");
                        cache.add(key.clone(), key.clone().into_bytes());
                        assert_eq!(cache.get(&key), Some(key.into_bytes()));

                        // Shared keys are written by every thread
                        let shared_key = format!("shared-{}", k % 10);
                        cache.add(shared_key.clone(), format!("thread-{t}"));
                        let value = cache.get(&shared_key).expect("shared key present");
                        assert!(String::from_utf8(value).unwrap().starts_with("thread-"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("worker thread panicked");
        }

        assert_eq!(cache.len(), threads * keys_per_thread + 10);
        for t in 0..threads {
            for k in 0..keys_per_thread {
                let key = format!("thread-{t}-key-{k}");
                assert_eq!(cache.get(&key), Some(key.clone().into_bytes()));
            }
        }
    }
}
