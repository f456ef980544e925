use async_trait::async_trait;
use gatehouse_core::{
    Error,
    error::{AuthError, StorageError},
    repositories::CredentialRepository,
    user::{NewUserRecord, Role, UserId, UserRecord},
};
use sqlx::SqlitePool;

use super::from_timestamp;

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteUser {
    id: String,
    login: String,
    password_hash: String,
    role: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteUser> for UserRecord {
    type Error = Error;

    fn try_from(row: SqliteUser) -> Result<Self, Self::Error> {
        Ok(UserRecord {
            id: UserId::new(&row.id),
            login: row.login,
            password_hash: row.password_hash,
            role: Role::from(row.role),
            created_at: from_timestamp(row.created_at)?,
            updated_at: from_timestamp(row.updated_at)?,
        })
    }
}

#[async_trait]
impl CredentialRepository for SqliteUserRepository {
    async fn create(&self, user: NewUserRecord) -> Result<UserRecord, Error> {
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteUser>(
            r#"
            INSERT INTO users (id, login, password_hash, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING id, login, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Auth(AuthError::UserAlreadyExists)
            }
            e => {
                tracing::error!(error = %e, "Failed to create user");
                Error::Storage(StorageError::Database("Failed to create user".to_string()))
            }
        })?;

        row.try_into()
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(
            r#"
            SELECT id, login, password_hash, role, created_at, updated_at
            FROM users
            WHERE login = ?1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find user by login");
            StorageError::Database("Failed to find user by login".to_string())
        })?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(
            r#"
            SELECT id, login, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find user by id");
            StorageError::Database("Failed to find user by id".to_string())
        })?;

        row.map(UserRecord::try_from).transpose()
    }
}
