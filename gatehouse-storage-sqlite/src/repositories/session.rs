use async_trait::async_trait;
use chrono::Utc;
use gatehouse_core::{
    Error,
    address::SourceAddress,
    error::StorageError,
    repositories::SessionRepository,
    session::{AuthenticatedSession, SessionToken},
    user::{Role, UserId},
};
use sqlx::SqlitePool;

use super::from_timestamp;

pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteSession {
    token_hash: String,
    user_id: String,
    role: String,
    source_address: String,
    created_at: i64,
    expires_at: i64,
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: AuthenticatedSession) -> Result<AuthenticatedSession, Error> {
        // Only the digest is persisted; the caller keeps the plaintext token
        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, role, source_address, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(session.token.token_hash())
        .bind(session.user_id.as_str())
        .bind(session.role.as_str())
        .bind(session.source_address.key())
        .bind(session.created_at.timestamp())
        .bind(session.expires_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create session");
            StorageError::Database("Failed to create session".to_string())
        })?;

        Ok(session)
    }

    async fn find_by_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<AuthenticatedSession>, Error> {
        let row = sqlx::query_as::<_, SqliteSession>(
            r#"
            SELECT token_hash, user_id, role, source_address, created_at, expires_at
            FROM sessions
            WHERE token_hash = ?1
            "#,
        )
        .bind(token.token_hash())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find session");
            StorageError::Database("Failed to find session".to_string())
        })?;

        let Some(row) = row else {
            return Ok(None);
        };

        if !token.verify_hash(&row.token_hash) {
            return Ok(None);
        }

        let source_address = SourceAddress::parse(&row.source_address).map_err(|e| {
            tracing::error!(error = %e, "Stored session has an unreadable source address");
            StorageError::Database("Invalid session source address".to_string())
        })?;

        Ok(Some(AuthenticatedSession {
            token: token.clone(),
            user_id: UserId::new(&row.user_id),
            role: Role::from(row.role),
            source_address,
            created_at: from_timestamp(row.created_at)?,
            expires_at: from_timestamp(row.expires_at)?,
        }))
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?1")
            .bind(token.token_hash())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete session");
                StorageError::Database("Failed to delete session".to_string())
            })?;

        Ok(())
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete user sessions");
                StorageError::Database("Failed to delete user sessions".to_string())
            })?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to clean up expired sessions");
                StorageError::Database("Failed to clean up expired sessions".to_string())
            })?;

        Ok(result.rows_affected())
    }
}
