use crate::{SessionError, SessionRepository};

/// Ends sessions on request of their owner.
pub struct LogoutAction<S: SessionRepository> {
    sessions: S,
}

impl<S: SessionRepository> LogoutAction<S> {
    /// Creates a new `LogoutAction`.
    pub fn new(sessions: S) -> Self {
        LogoutAction { sessions }
    }

    /// Ends the session identified by `token`.
    ///
    /// Unknown tokens are not an error.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "logout", skip_all, err)
    )]
    pub async fn execute(&self, token: &str) -> Result<(), SessionError> {
        self.sessions.delete_key(token).await?;

        log::info!(
            target: "photosite::session",
            "msg=\"logout success\""
        );

        Ok(())
    }

    /// Ends every session belonging to `username`, on every device.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "logout_everywhere", skip(self), err)
    )]
    pub async fn execute_everywhere(&self, username: &str) -> Result<(), SessionError> {
        self.sessions.delete(username).await?;

        log::info!(
            target: "photosite::session",
            "msg=\"logout everywhere\", username={username}"
        );

        Ok(())
    }
}
