use crate::{
    Error,
    address::SourceAddress,
    repositories::{
        CredentialRepository, IpRangeRepository, RateLimitRepository, RepositoryProvider,
        SessionRepository,
    },
    session::{AuthenticatedSession, SessionToken},
    storage::{IpRangeEntry, NewIpRange, RateLimitRecord},
    user::{NewUserRecord, UserId, UserRecord},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Adapter that wraps a RepositoryProvider and implements [`CredentialRepository`]
pub struct CredentialRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> CredentialRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> CredentialRepository for CredentialRepositoryAdapter<R> {
    async fn create(&self, user: NewUserRecord) -> Result<UserRecord, Error> {
        self.provider.credential().create(user).await
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, Error> {
        self.provider.credential().find_by_login(login).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, Error> {
        self.provider.credential().find_by_id(id).await
    }
}

pub struct SessionRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SessionRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SessionRepository for SessionRepositoryAdapter<R> {
    async fn create(&self, session: AuthenticatedSession) -> Result<AuthenticatedSession, Error> {
        self.provider.session().create(session).await
    }

    async fn find_by_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<AuthenticatedSession>, Error> {
        self.provider.session().find_by_token(token).await
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.provider.session().delete(token).await
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.session().delete_by_user_id(user_id).await
    }

    async fn cleanup_expired(&self) -> Result<u64, Error> {
        self.provider.session().cleanup_expired().await
    }
}

pub struct RateLimitRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> RateLimitRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> RateLimitRepository for RateLimitRepositoryAdapter<R> {
    async fn record_attempt(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<RateLimitRecord, Error> {
        self.provider
            .rate_limit()
            .record_attempt(key, now, window)
            .await
    }

    async fn find(&self, key: &str) -> Result<Option<RateLimitRecord>, Error> {
        self.provider.rate_limit().find(key).await
    }

    async fn reset(&self, key: &str) -> Result<bool, Error> {
        self.provider.rate_limit().reset(key).await
    }
}

pub struct IpRangeRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> IpRangeRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> IpRangeRepository for IpRangeRepositoryAdapter<R> {
    async fn find_active_match(
        &self,
        address: &SourceAddress,
    ) -> Result<Option<IpRangeEntry>, Error> {
        self.provider.ip_range().find_active_match(address).await
    }

    async fn create(&self, range: NewIpRange) -> Result<IpRangeEntry, Error> {
        self.provider.ip_range().create(range).await
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool, Error> {
        self.provider.ip_range().set_active(id, active).await
    }

    async fn list(&self) -> Result<Vec<IpRangeEntry>, Error> {
        self.provider.ip_range().list().await
    }
}
