//! In-memory session storage.
//!
//! Suitable for development, testing, and deployments where a restart may
//! log everyone out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::SessionRecord;
use super::repository::SessionRepository;
use crate::SessionError;
use crate::crypto::generate_token;
use crate::events::LengthSink;

/// In-memory session storage.
///
/// Stores sessions in a `HashMap` keyed by token, behind one `Mutex` that
/// serializes every operation.
///
/// # Note
///
/// Sessions are lost when the process restarts.
/// For persistent storage, use [`DiskSessionRepository`](super::DiskSessionRepository).
#[derive(Clone)]
pub struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<String, SessionRecord>>>,
    key_length: usize,
    length: LengthSink,
}

impl InMemorySessionRepository {
    /// Creates an empty repository issuing tokens of `key_length` random bytes.
    pub fn new(key_length: usize, length: LengthSink) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::with_capacity(10))),
            key_length,
            length,
        }
    }

    /// Returns the number of sessions currently stored.
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Returns true if there are no sessions stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, SessionRecord>>, SessionError> {
        self.sessions.lock().map_err(|_| SessionError::LockPoisoned)
    }

    /// Removes every record matching `expired`, reporting each one.
    fn remove_where(&self, expired: impl Fn(&SessionRecord) -> bool) -> Result<u64, SessionError> {
        let mut sessions = self.lock()?;
        let before = sessions.len();

        sessions.retain(|_, record| {
            if expired(record) {
                self.length.publish(record.length());
                false
            } else {
                true
            }
        });

        let removed = before.saturating_sub(sessions.len());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn has_key(&self, token: &str) -> Result<Option<String>, SessionError> {
        let mut sessions = self.lock()?;

        Ok(sessions.get_mut(token).map(|record| {
            record.touch(Utc::now());
            record.username.clone()
        }))
    }

    async fn insert(&self, username: &str) -> Result<String, SessionError> {
        let token = generate_token(self.key_length)?;

        self.lock()?
            .insert(token.clone(), SessionRecord::new(username, Utc::now()));

        Ok(token)
    }

    async fn delete(&self, username: &str) -> Result<(), SessionError> {
        let removed = self.remove_where(|record| record.username == username)?;

        log::debug!(
            target: "photosite::session",
            "msg=\"sessions deleted\", username={username}, removed={removed}"
        );

        Ok(())
    }

    async fn delete_key(&self, token: &str) -> Result<(), SessionError> {
        if let Some(record) = self.lock()?.remove(token) {
            self.length.publish(record.length());
        }

        Ok(())
    }

    async fn expire_before(
        &self,
        update: DateTime<Utc>,
        create: DateTime<Utc>,
    ) -> Result<u64, SessionError> {
        self.remove_where(|record| record.is_expired(update, create))
    }

    async fn close(&self) -> Result<(), SessionError> {
        Ok(())
    }
}
