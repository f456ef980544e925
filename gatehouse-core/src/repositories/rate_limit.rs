//! Repository trait for the rate-limit counter store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::{Error, storage::RateLimitRecord};

/// Repository for per-identity attempt counters.
///
/// One logical row exists per key. The store is shared by every concurrent
/// login attempt, so the counter update must be a single atomic operation.
///
/// # Concurrency
///
/// [`record_attempt`](Self::record_attempt) is a read-increment-write. Running
/// it as separate read and write statements loses updates when two attempts
/// for the same key interleave. Implementations must perform it as one atomic
/// upsert (a conditional `INSERT .. ON CONFLICT DO UPDATE`, a compare-and-swap
/// loop, or an equivalent under a lock).
#[async_trait]
pub trait RateLimitRepository: Send + Sync + 'static {
    /// Atomically apply one attempt for `key` at `now` and return the updated record.
    ///
    /// - No record: create `{attempt_count: 1, window_start: now, last_attempt: now}`.
    /// - `now - window_start > window`: reset to the same shape as a fresh record.
    /// - Otherwise: increment `attempt_count` and set `last_attempt = now`.
    async fn record_attempt(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<RateLimitRecord, Error>;

    /// Read the current record for `key` without modifying it.
    async fn find(&self, key: &str) -> Result<Option<RateLimitRecord>, Error>;

    /// Delete the record for `key`, returning whether one existed.
    ///
    /// Operator tooling only; the login pipeline never resets counters.
    async fn reset(&self, key: &str) -> Result<bool, Error>;
}
