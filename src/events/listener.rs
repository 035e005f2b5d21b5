use async_trait::async_trait;

use super::SessionLength;

/// Consumer of session length events.
///
/// Implement this trait to feed session lengths into metrics, audit logs or
/// anything else. Register listeners on an
/// [`EventRegistry`](super::EventRegistry).
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Handle one ended session.
    async fn handle(&self, length: &SessionLength);
}
