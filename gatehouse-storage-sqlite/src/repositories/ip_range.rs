//! SQLite implementation of the IP reputation range table.

use async_trait::async_trait;
use chrono::Utc;
use gatehouse_core::{
    Error,
    address::{IpVersion, SourceAddress, decode, encode},
    error::StorageError,
    repositories::IpRangeRepository,
    storage::{IpRangeEntry, NewIpRange},
};
use sqlx::SqlitePool;

use super::from_timestamp;

pub struct SqliteIpRangeRepository {
    pool: SqlitePool,
}

impl SqliteIpRangeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteIpRange {
    id: i64,
    ip_version: i64,
    range_start: Vec<u8>,
    range_end: Vec<u8>,
    active: bool,
    created_at: i64,
}

impl TryFrom<SqliteIpRange> for IpRangeEntry {
    type Error = Error;

    fn try_from(row: SqliteIpRange) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = move || StorageError::Database(format!("Invalid IP range row {id}"));

        Ok(IpRangeEntry {
            id,
            version: IpVersion::from_i64(row.ip_version).ok_or_else(invalid)?,
            range_start: decode(&row.range_start).ok_or_else(invalid)?,
            range_end: decode(&row.range_end).ok_or_else(invalid)?,
            active: row.active,
            created_at: from_timestamp(row.created_at)?,
        })
    }
}

#[async_trait]
impl IpRangeRepository for SqliteIpRangeRepository {
    async fn find_active_match(
        &self,
        address: &SourceAddress,
    ) -> Result<Option<IpRangeEntry>, Error> {
        // Equal-width big-endian BLOBs compare like the numbers they encode
        let row = sqlx::query_as::<_, SqliteIpRange>(
            r#"
            SELECT id, ip_version, range_start, range_end, active, created_at
            FROM ip_ranges
            WHERE active = 1
              AND ip_version = ?1
              AND range_start <= ?2
              AND range_end >= ?2
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(address.version().as_i64())
        .bind(address.encoded())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to look up IP range");
            StorageError::Database("Failed to look up IP range".to_string())
        })?;

        row.map(IpRangeEntry::try_from).transpose()
    }

    async fn create(&self, range: NewIpRange) -> Result<IpRangeEntry, Error> {
        let row = sqlx::query_as::<_, SqliteIpRange>(
            r#"
            INSERT INTO ip_ranges (ip_version, range_start, range_end, active, created_at)
            VALUES (?1, ?2, ?3, 1, ?4)
            RETURNING id, ip_version, range_start, range_end, active, created_at
            "#,
        )
        .bind(range.version.as_i64())
        .bind(encode(&range.range_start))
        .bind(encode(&range.range_end))
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create IP range");
            StorageError::Database("Failed to create IP range".to_string())
        })?;

        row.try_into()
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool, Error> {
        let result = sqlx::query("UPDATE ip_ranges SET active = ?1 WHERE id = ?2")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to update IP range");
                StorageError::Database("Failed to update IP range".to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<IpRangeEntry>, Error> {
        let rows = sqlx::query_as::<_, SqliteIpRange>(
            r#"
            SELECT id, ip_version, range_start, range_end, active, created_at
            FROM ip_ranges
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list IP ranges");
            StorageError::Database("Failed to list IP ranges".to_string())
        })?;

        rows.into_iter().map(IpRangeEntry::try_from).collect()
    }
}
