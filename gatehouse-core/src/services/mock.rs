//! In-memory repositories for service tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    Error,
    error::StorageError,
    repositories::{CredentialRepository, SessionRepository},
    session::{AuthenticatedSession, SessionToken},
    user::{NewUserRecord, UserId, UserRecord},
};

#[derive(Default)]
pub struct MockCredentialRepository {
    users: Mutex<Vec<UserRecord>>,
    lookups: AtomicUsize,
    pub fail: AtomicBool,
}

impl MockCredentialRepository {
    /// Number of `find_by_login` calls observed
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialRepository for MockCredentialRepository {
    async fn create(&self, user: NewUserRecord) -> Result<UserRecord, Error> {
        let now = Utc::now();
        let record = UserRecord {
            id: user.id,
            login: user.login,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("credential store unavailable".into()).into());
        }
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.login == login).cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, Error> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| &u.id == id).cloned())
    }
}

#[derive(Default)]
pub struct MockSessionRepository {
    sessions: Mutex<HashMap<String, AuthenticatedSession>>,
}

impl MockSessionRepository {
    pub fn count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionRepository for MockSessionRepository {
    async fn create(&self, session: AuthenticatedSession) -> Result<AuthenticatedSession, Error> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.token.token_hash(), session.clone());
        Ok(session)
    }

    async fn find_by_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<AuthenticatedSession>, Error> {
        Ok(self.sessions.lock().unwrap().get(&token.token_hash()).cloned())
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.sessions.lock().unwrap().remove(&token.token_hash());
        Ok(())
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error> {
        self.sessions
            .lock()
            .unwrap()
            .retain(|_, s| &s.user_id != user_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, Error> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}
