//! Rate Limiting Infrastructure
//!
//! Per-client request counting over a time window. Each client key maps to the
//! list of its recent request timestamps; entries older than the window are
//! evicted lazily whenever the list is read.
//!
//! Stores do a plain read-then-write with no locking across requests, so two
//! concurrent requests from the same client may both be admitted. That is
//! acceptable for abuse deterrence on a low-traffic site.

use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::sync::Mutex;

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(3600),
        }
    }
}

impl RateLimitConfig {
    /// A zero window is raised to one second.
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs.max(1)),
        }
    }

    /// Window length in whole seconds, never less than one
    pub fn window_secs(&self) -> i64 {
        i64::try_from(self.window.as_secs())
            .unwrap_or(i64::MAX)
            .max(1)
    }
}

/// Rate limit check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests still available in the current window after this one
    pub remaining: u32,
    /// Seconds until the oldest recorded request leaves the window (0 if allowed)
    pub retry_after_secs: u64,
}

/// Storage failures
#[derive(Debug, Error)]
pub enum RateLimitStoreError {
    #[error("rate limit store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid rate limit key: {0:?}")]
    InvalidKey(String),
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Recorded request timestamps (unix seconds) for a client, oldest first
    async fn get_window(&self, key: &str) -> Result<Vec<i64>, RateLimitStoreError>;

    /// Replace the recorded timestamps for a client
    async fn set_window(&self, key: &str, timestamps: &[i64]) -> Result<(), RateLimitStoreError>;

    /// Delete records untouched for longer than `max_age`, returning how many
    async fn sweep(&self, max_age: Duration) -> Result<usize, RateLimitStoreError>;
}

// ============================================================================
// Limiter
// ============================================================================

/// Opportunistic cleanup of stale records
#[derive(Debug, Clone, Copy)]
pub struct SweepPolicy {
    /// Records untouched for longer than this are deleted
    pub max_age: Duration,
    /// Chance (0-100) that a request triggers a sweep
    pub probability_percent: u8,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(86_400),
            probability_percent: 1,
        }
    }
}

/// Window-based request limiter over a [`RateLimitStore`]
pub struct RateLimiter<S> {
    store: Arc<S>,
    sweep: SweepPolicy,
}

impl<S> Clone for RateLimiter<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            sweep: self.sweep,
        }
    }
}

impl<S> RateLimiter<S>
where
    S: RateLimitStore + Send + Sync,
{
    pub fn new(store: Arc<S>, sweep: SweepPolicy) -> Self {
        Self { store, sweep }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Check the limit for `key` and record this request if it is admitted
    pub async fn check_and_record(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitDecision, RateLimitStoreError> {
        self.check_and_record_at(key, config, chrono::Utc::now().timestamp())
            .await
    }

    /// Same as [`check_and_record`](Self::check_and_record) as of `now` (unix seconds)
    pub async fn check_and_record_at(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now: i64,
    ) -> Result<RateLimitDecision, RateLimitStoreError> {
        let window = config.window_secs();

        let mut timestamps = self.store.get_window(key).await?;
        timestamps.retain(|&ts| now.saturating_sub(ts) < window);

        let count = u32::try_from(timestamps.len()).unwrap_or(u32::MAX);
        if count >= config.max_requests {
            let retry_after = match timestamps.iter().min() {
                Some(&oldest) => window
                    .saturating_sub(now.saturating_sub(oldest))
                    .clamp(1, window),
                None => window,
            };

            tracing::warn!(
                client_key = %key,
                count,
                max = config.max_requests,
                retry_after,
                "Rate limit exceeded"
            );

            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after_secs: u64::try_from(retry_after).unwrap_or(0),
            });
        }

        timestamps.push(now);
        self.store.set_window(key, &timestamps).await?;

        Ok(RateLimitDecision {
            allowed: true,
            remaining: config.max_requests - count - 1,
            retry_after_secs: 0,
        })
    }

    /// Sweep stale records with the configured probability
    ///
    /// Errors are logged and swallowed; maintenance never fails a request.
    pub async fn maybe_sweep(&self) {
        let roll: u8 = rand::thread_rng().gen_range(0..100);
        if roll >= self.sweep.probability_percent {
            return;
        }

        match self.store.sweep(self.sweep.max_age).await {
            Ok(removed) => {
                tracing::debug!(removed, "Rate limit records swept");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rate limit sweep failed");
            }
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store, used in tests and development
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    windows: Mutex<HashMap<String, Vec<i64>>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.windows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.windows.lock().await.is_empty()
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn get_window(&self, key: &str) -> Result<Vec<i64>, RateLimitStoreError> {
        Ok(self
            .windows
            .lock()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_window(&self, key: &str, timestamps: &[i64]) -> Result<(), RateLimitStoreError> {
        self.windows
            .lock()
            .await
            .insert(key.to_string(), timestamps.to_vec());
        Ok(())
    }

    async fn sweep(&self, max_age: Duration) -> Result<usize, RateLimitStoreError> {
        let cutoff = chrono::Utc::now().timestamp()
            - i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);

        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, timestamps| timestamps.iter().any(|&ts| ts >= cutoff));
        Ok(before - windows.len())
    }
}

// ============================================================================
// File store
// ============================================================================

/// One JSON file per client key under a private directory
///
/// Each file holds a JSON array of unix timestamps, e.g. `[1700000000,1700000120]`.
#[derive(Debug, Clone)]
pub struct FileRateLimitStore {
    dir: PathBuf,
}

impl FileRateLimitStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the per-client records
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, RateLimitStoreError> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RateLimitStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl RateLimitStore for FileRateLimitStore {
    async fn get_window(&self, key: &str) -> Result<Vec<i64>, RateLimitStoreError> {
        let path = self.path_for(key)?;

        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Vec<i64>>(&contents) {
            Ok(timestamps) => Ok(timestamps),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt rate limit record, resetting");
                Ok(Vec::new())
            }
        }
    }

    async fn set_window(&self, key: &str, timestamps: &[i64]) -> Result<(), RateLimitStoreError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let body = serde_json::to_vec(timestamps).map_err(std::io::Error::other)?;
        tokio::fs::write(&path, body).await?;
        Ok(())
    }

    async fn sweep(&self, max_age: Duration) -> Result<usize, RateLimitStoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let modified = entry.metadata().await?.modified()?;
            let stale = modified
                .elapsed()
                .map(|age| age > max_age)
                .unwrap_or(false);

            if stale {
                tokio::fs::remove_file(&path).await?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Arc, Duration, FileRateLimitStore, MemoryRateLimitStore, RateLimitConfig, RateLimitStore,
        RateLimitStoreError, RateLimiter, SweepPolicy,
    };

    const NOW: i64 = 1_700_000_000;
    const KEY: &str = "abc123";

    fn limiter<S: RateLimitStore + Send + Sync>(store: S) -> RateLimiter<S> {
        RateLimiter::new(Arc::new(store), SweepPolicy::default())
    }

    #[tokio::test]
    async fn test_allows_up_to_max_then_rejects() {
        let limiter = limiter(MemoryRateLimitStore::new());
        let config = RateLimitConfig::new(3, 60);

        for i in 0..3 {
            let decision = limiter.check_and_record_at(KEY, &config, NOW + i).await.unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.remaining, 2 - i as u32);
        }

        let decision = limiter.check_and_record_at(KEY, &config, NOW + 10).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_secs, 50);
    }

    #[tokio::test]
    async fn test_rejected_request_is_not_recorded() {
        let limiter = limiter(MemoryRateLimitStore::new());
        let config = RateLimitConfig::new(1, 60);

        assert!(limiter.check_and_record_at(KEY, &config, NOW).await.unwrap().allowed);
        assert!(!limiter.check_and_record_at(KEY, &config, NOW + 1).await.unwrap().allowed);

        let stored = limiter.store().get_window(KEY).await.unwrap();
        assert_eq!(stored, vec![NOW]);
    }

    #[tokio::test]
    async fn test_window_expiry_readmits() {
        let limiter = limiter(MemoryRateLimitStore::new());
        let config = RateLimitConfig::new(2, 60);

        limiter.check_and_record_at(KEY, &config, NOW).await.unwrap();
        limiter.check_and_record_at(KEY, &config, NOW + 30).await.unwrap();
        assert!(!limiter.check_and_record_at(KEY, &config, NOW + 59).await.unwrap().allowed);

        // The oldest entry leaves the window exactly `window` seconds later
        let decision = limiter.check_and_record_at(KEY, &config, NOW + 60).await.unwrap();
        assert!(decision.allowed);

        let stored = limiter.store().get_window(KEY).await.unwrap();
        assert_eq!(stored, vec![NOW + 30, NOW + 60]);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = limiter(MemoryRateLimitStore::new());
        let config = RateLimitConfig::new(1, 60);

        assert!(limiter.check_and_record_at("a", &config, NOW).await.unwrap().allowed);
        assert!(limiter.check_and_record_at("b", &config, NOW).await.unwrap().allowed);
        assert!(!limiter.check_and_record_at("a", &config, NOW).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_zero_max_always_rejects() {
        let limiter = limiter(MemoryRateLimitStore::new());
        let config = RateLimitConfig::new(0, 60);

        let decision = limiter.check_and_record_at(KEY, &config, NOW).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_secs, 60);
    }

    #[tokio::test]
    async fn test_zero_window_is_one_second() {
        let limiter = limiter(MemoryRateLimitStore::new());
        let config = RateLimitConfig::new(1, 0);
        assert_eq!(config.window, Duration::from_secs(1));

        let unclamped = RateLimitConfig {
            max_requests: 1,
            window: Duration::ZERO,
        };
        assert_eq!(unclamped.window_secs(), 1);

        assert!(limiter.check_and_record_at(KEY, &config, NOW).await.unwrap().allowed);
        let decision = limiter.check_and_record_at(KEY, &unclamped, NOW).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_secs, 1);
        assert!(limiter.check_and_record_at(KEY, &config, NOW + 1).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_huge_window_with_future_timestamp() {
        let store = MemoryRateLimitStore::new();
        store.set_window(KEY, &[i64::MAX]).await.unwrap();
        let limiter = limiter(store);
        let config = RateLimitConfig::new(1, u64::MAX);

        let decision = limiter.check_and_record_at(KEY, &config, i64::MIN).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_secs, i64::MAX as u64);
    }

    #[tokio::test]
    async fn test_memory_sweep_removes_stale() {
        let store = MemoryRateLimitStore::new();
        let now = chrono::Utc::now().timestamp();
        store.set_window("old", &[now - 100_000]).await.unwrap();
        store.set_window("fresh", &[now - 10]).await.unwrap();

        let removed = store.sweep(Duration::from_secs(86_400)).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRateLimitStore::new(dir.path().join("_rate_limit"));

        assert!(store.get_window(KEY).await.unwrap().is_empty());

        store.set_window(KEY, &[NOW, NOW + 5]).await.unwrap();
        assert_eq!(store.get_window(KEY).await.unwrap(), vec![NOW, NOW + 5]);

        assert_eq!(store.dir(), dir.path().join("_rate_limit"));
        let raw = std::fs::read_to_string(store.dir().join("abc123.json")).unwrap();
        assert_eq!(raw, "[1700000000,1700000005]");
    }

    #[tokio::test]
    async fn test_file_store_corrupt_record_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc123.json"), b"{not json").unwrap();

        let store = FileRateLimitStore::new(dir.path());
        assert!(store.get_window(KEY).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRateLimitStore::new(dir.path());

        let result = store.get_window("../etc/passwd").await;
        assert!(matches!(result, Err(RateLimitStoreError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_file_store_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRateLimitStore::new(dir.path());
        store.set_window("old", &[NOW]).await.unwrap();
        store.set_window("fresh", &[NOW]).await.unwrap();

        let old = std::fs::File::options()
            .write(true)
            .open(dir.path().join("old.json"))
            .unwrap();
        old.set_modified(std::time::SystemTime::now() - Duration::from_secs(90_000))
            .unwrap();

        let removed = store.sweep(Duration::from_secs(86_400)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(!dir.path().join("old.json").exists());
        assert!(dir.path().join("fresh.json").exists());
    }

    #[tokio::test]
    async fn test_file_store_sweep_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRateLimitStore::new(dir.path().join("missing"));
        assert_eq!(store.sweep(Duration::from_secs(1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_limiter_over_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let limiter = limiter(FileRateLimitStore::new(dir.path()));
        let config = RateLimitConfig::new(1, 3600);

        assert!(limiter.check_and_record_at(KEY, &config, NOW).await.unwrap().allowed);
        let decision = limiter.check_and_record_at(KEY, &config, NOW + 600).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_secs, 3000);
    }

    #[tokio::test]
    async fn test_maybe_sweep_always_and_never() {
        let store = Arc::new(MemoryRateLimitStore::new());
        store.set_window("old", &[0]).await.unwrap();

        let never = RateLimiter::new(
            store.clone(),
            SweepPolicy {
                max_age: Duration::from_secs(1),
                probability_percent: 0,
            },
        );
        never.maybe_sweep().await;
        assert_eq!(store.len().await, 1);

        let always = RateLimiter::new(
            store.clone(),
            SweepPolicy {
                max_age: Duration::from_secs(1),
                probability_percent: 100,
            },
        );
        always.maybe_sweep().await;
        assert!(store.is_empty().await);
    }
}
