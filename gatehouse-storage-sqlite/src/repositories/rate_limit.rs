//! SQLite implementation of the rate-limit counter store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use gatehouse_core::{
    Error, error::StorageError, repositories::RateLimitRepository, storage::RateLimitRecord,
};
use sqlx::SqlitePool;

use super::from_timestamp;

pub struct SqliteRateLimitRepository {
    pool: SqlitePool,
}

impl SqliteRateLimitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteRateLimit {
    key: String,
    attempt_count: i64,
    window_start: i64,
    last_attempt: i64,
}

impl TryFrom<SqliteRateLimit> for RateLimitRecord {
    type Error = Error;

    fn try_from(row: SqliteRateLimit) -> Result<Self, Self::Error> {
        Ok(RateLimitRecord {
            key: row.key,
            attempt_count: u32::try_from(row.attempt_count).unwrap_or(u32::MAX),
            window_start: from_timestamp(row.window_start)?,
            last_attempt: from_timestamp(row.last_attempt)?,
        })
    }
}

#[async_trait]
impl RateLimitRepository for SqliteRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<RateLimitRecord, Error> {
        // A single statement, so concurrent attempts for one key serialise on
        // the row instead of reading the same pre-increment count.
        let row = sqlx::query_as::<_, SqliteRateLimit>(
            r#"
            INSERT INTO rate_limits (key, attempt_count, window_start, last_attempt)
            VALUES (?1, 1, ?2, ?2)
            ON CONFLICT(key) DO UPDATE SET
                attempt_count = CASE
                    WHEN ?2 - rate_limits.window_start > ?3 THEN 1
                    ELSE rate_limits.attempt_count + 1
                END,
                window_start = CASE
                    WHEN ?2 - rate_limits.window_start > ?3 THEN ?2
                    ELSE rate_limits.window_start
                END,
                last_attempt = ?2
            RETURNING key, attempt_count, window_start, last_attempt
            "#,
        )
        .bind(key)
        .bind(now.timestamp())
        .bind(window.num_seconds())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, key = %key, "Failed to record login attempt");
            StorageError::Database("Failed to record login attempt".to_string())
        })?;

        row.try_into()
    }

    async fn find(&self, key: &str) -> Result<Option<RateLimitRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteRateLimit>(
            r#"
            SELECT key, attempt_count, window_start, last_attempt
            FROM rate_limits
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to read rate limit record");
            StorageError::Database("Failed to read rate limit record".to_string())
        })?;

        row.map(RateLimitRecord::try_from).transpose()
    }

    async fn reset(&self, key: &str) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM rate_limits WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reset rate limit record");
                StorageError::Database("Failed to reset rate limit record".to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }
}
