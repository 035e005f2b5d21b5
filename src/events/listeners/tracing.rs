use async_trait::async_trait;

use crate::events::{Listener, SessionLength};

/// Emits ended sessions as tracing events.
///
/// Requires the `tracing` feature to be enabled.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, length: &SessionLength) {
        tracing::info!(
            target: "photosite::events",
            username = %length.username,
            start = %length.start,
            duration_secs = length.duration.num_seconds(),
            "session ended"
        );
    }
}
