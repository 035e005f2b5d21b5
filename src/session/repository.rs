//! Session repository trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::SessionError;

/// Storage for session tokens.
///
/// Implementations provide different storage backends:
/// - [`InMemorySessionRepository`](super::InMemorySessionRepository): lost on restart
/// - [`DiskSessionRepository`](super::DiskSessionRepository): persisted in a single file
///
/// Every session that ends through [`delete`](Self::delete),
/// [`delete_key`](Self::delete_key) or [`expire_before`](Self::expire_before)
/// is reported once on the repository's [`LengthSink`](crate::LengthSink).
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Looks up the username for a token and records activity on it.
    ///
    /// Returns `Ok(None)` if the token is unknown.
    async fn has_key(&self, token: &str) -> Result<Option<String>, SessionError>;

    /// Starts a new session for `username` and returns its token.
    async fn insert(&self, username: &str) -> Result<String, SessionError>;

    /// Ends every session belonging to `username`.
    async fn delete(&self, username: &str) -> Result<(), SessionError>;

    /// Ends the session for a single token, if it exists.
    async fn delete_key(&self, token: &str) -> Result<(), SessionError>;

    /// Ends every session last active before `update` or created before `create`.
    ///
    /// Returns the number of sessions removed.
    async fn expire_before(
        &self,
        update: DateTime<Utc>,
        create: DateTime<Utc>,
    ) -> Result<u64, SessionError>;

    /// Releases the backing storage.
    ///
    /// Must only be called once request handling and the sweeper have stopped.
    /// Storage is released even when staged activity could not be flushed;
    /// that failure is still returned.
    async fn close(&self) -> Result<(), SessionError>;
}

#[async_trait]
impl<T> SessionRepository for Arc<T>
where
    T: SessionRepository + ?Sized,
{
    async fn has_key(&self, token: &str) -> Result<Option<String>, SessionError> {
        (**self).has_key(token).await
    }

    async fn insert(&self, username: &str) -> Result<String, SessionError> {
        (**self).insert(username).await
    }

    async fn delete(&self, username: &str) -> Result<(), SessionError> {
        (**self).delete(username).await
    }

    async fn delete_key(&self, token: &str) -> Result<(), SessionError> {
        (**self).delete_key(token).await
    }

    async fn expire_before(
        &self,
        update: DateTime<Utc>,
        create: DateTime<Utc>,
    ) -> Result<u64, SessionError> {
        (**self).expire_before(update, create).await
    }

    async fn close(&self) -> Result<(), SessionError> {
        (**self).close().await
    }
}
