//! run periodically to expire idle and over-age sessions.

use chrono::{DateTime, Duration, Utc};

use crate::{SessionConfig, SessionError, SessionRepository};

pub struct PruneExpiredSessionsAction<S> {
    sessions: S,
    idle_timeout: Duration,
    max_lifetime: Duration,
}

impl<S: SessionRepository> PruneExpiredSessionsAction<S> {
    /// Creates a new `PruneExpiredSessionsAction`.
    ///
    /// Sessions idle for longer than `idle_timeout`, or older than
    /// `max_lifetime`, are removed on every run.
    pub fn new(sessions: S, idle_timeout: Duration, max_lifetime: Duration) -> Self {
        Self {
            sessions,
            idle_timeout,
            max_lifetime,
        }
    }

    /// Creates the action with the timeouts from `config`.
    pub fn from_config(sessions: S, config: &SessionConfig) -> Self {
        Self::new(sessions, config.idle_timeout, config.max_lifetime)
    }

    /// Removes every expired session as of now.
    ///
    /// # Returns
    ///
    /// - `Ok(count)` - number of sessions removed
    /// - `Err(_)` - storage errors; nothing was removed
    pub async fn execute(&self) -> Result<u64, SessionError> {
        self.execute_at(Utc::now()).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self), name = "prune_expired_sessions", err)
    )]
    pub async fn execute_at(&self, now: DateTime<Utc>) -> Result<u64, SessionError> {
        let removed = self
            .sessions
            .expire_before(now - self.idle_timeout, now - self.max_lifetime)
            .await?;

        log::info!(
            target: "photosite::session",
            "msg=\"sessions pruned\", removed={removed}"
        );

        Ok(removed)
    }
}
