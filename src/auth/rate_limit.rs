//! Login attempt rate limiting.
//!
//! Every login attempt reserves a slot in an [`AttemptStore`] before the
//! credentials are checked; the check and the increment happen in one step
//! so a burst of parallel requests cannot all slip past the limit. The
//! window is anchored at the first attempt: once [`MAX_LOGIN_ATTEMPTS`]
//! attempts land inside it, every further attempt is refused until the
//! window elapses. A successful login clears the record.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::token::now_secs;

/// Failed attempts allowed per window.
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Length of the rate-limit window.
pub const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Minimum spacing between sweeps of expired records in the in-memory store.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Attempt record for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
    pub attempts: u32,
    /// Unix seconds of the first attempt in the current window
    pub window_start: u64,
}

impl AttemptRecord {
    fn expires_at(&self, window: Duration) -> u64 {
        self.window_start.saturating_add(window.as_secs())
    }

    fn is_live(&self, now: u64, window: Duration) -> bool {
        now < self.expires_at(window)
    }
}

/// Result of trying to reserve an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// The attempt was counted; the record includes it
    Granted(AttemptRecord),
    /// The window is full; the record is unchanged
    Exhausted(AttemptRecord),
}

/// Storage for attempt records.
///
/// `reserve` must check and increment atomically. The in-memory
/// implementation suits a single instance; a shared store is needed once
/// several instances sit behind one address.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Count one attempt for `key` unless `max_attempts` already landed in
    /// the live window. An expired record starts a new window at `now`.
    async fn reserve(
        &self,
        key: &str,
        now: u64,
        max_attempts: u32,
        window: Duration,
    ) -> Reservation;

    async fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
struct AttemptTable {
    records: HashMap<String, AttemptRecord>,
    last_purge: u64,
}

/// Process-local attempt store.
///
/// Expired records are swept at most once per [`PURGE_INTERVAL`] while
/// reserving, so keys that are never seen again do not accumulate.
#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    table: Mutex<AttemptTable>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, live or not.
    pub async fn len(&self) -> usize {
        self.table.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop records whose window has elapsed.
    pub async fn purge_expired(&self, now: u64, window: Duration) {
        let mut table = self.table.lock().await;
        table.records.retain(|_, record| record.is_live(now, window));
        table.last_purge = now;
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn reserve(
        &self,
        key: &str,
        now: u64,
        max_attempts: u32,
        window: Duration,
    ) -> Reservation {
        let mut table = self.table.lock().await;

        if now >= table.last_purge.saturating_add(PURGE_INTERVAL.as_secs()) {
            table.records.retain(|_, record| record.is_live(now, window));
            table.last_purge = now;
        }

        let fresh = AttemptRecord {
            attempts: 0,
            window_start: now,
        };
        let record = table
            .records
            .get(key)
            .copied()
            .filter(|record| record.is_live(now, window))
            .unwrap_or(fresh);

        if record.attempts >= max_attempts {
            return Reservation::Exhausted(record);
        }

        let counted = AttemptRecord {
            attempts: record.attempts + 1,
            ..record
        };
        table.records.insert(key.to_string(), counted);
        Reservation::Granted(counted)
    }

    async fn remove(&self, key: &str) {
        self.table.lock().await.records.remove(key);
    }
}

/// Outcome of a rate-limit reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The attempt may proceed; `remaining` attempts are left if it fails
    Allowed { remaining: u32 },
    /// The key is locked out for `retry_after` more seconds
    Limited { retry_after: u64, reset_at: u64 },
}

/// Per-client login limiter over an injected store.
pub struct LoginRateLimiter {
    store: Box<dyn AttemptStore>,
    max_attempts: u32,
    window: Duration,
}

impl std::fmt::Debug for LoginRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRateLimiter")
            .field("max_attempts", &self.max_attempts)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new(Box::new(InMemoryAttemptStore::new()))
    }
}

impl LoginRateLimiter {
    pub fn new(store: Box<dyn AttemptStore>) -> Self {
        Self {
            store,
            max_attempts: MAX_LOGIN_ATTEMPTS,
            window: LOGIN_WINDOW,
        }
    }

    pub fn with_limits(mut self, max_attempts: u32, window: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.window = window;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Store key for a client address.
    pub fn key_for(client: &str) -> String {
        format!("login:{client}")
    }

    pub async fn reserve(&self, client: &str) -> RateLimitDecision {
        self.reserve_at(client, now_secs()).await
    }

    /// Count an attempt for `client` at `now`, or refuse it if the window
    /// is full. The attempt stays counted unless [`Self::clear`] is called.
    pub async fn reserve_at(&self, client: &str, now: u64) -> RateLimitDecision {
        let key = Self::key_for(client);
        match self
            .store
            .reserve(&key, now, self.max_attempts, self.window)
            .await
        {
            Reservation::Granted(record) => RateLimitDecision::Allowed {
                remaining: self.max_attempts.saturating_sub(record.attempts),
            },
            Reservation::Exhausted(record) => {
                let reset_at = record.expires_at(self.window);
                RateLimitDecision::Limited {
                    retry_after: reset_at.saturating_sub(now).max(1),
                    reset_at,
                }
            }
        }
    }

    /// Forget all attempts for `client`.
    pub async fn clear(&self, client: &str) {
        self.store.remove(&Self::key_for(client)).await;
    }
}

// =============================================================================
// Tests
// =============================================================================
