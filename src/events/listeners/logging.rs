use async_trait::async_trait;

use crate::events::{Listener, SessionLength};

/// Logs every ended session using the `log` crate.
///
/// # Example
///
/// ```rust,ignore
/// use photosite::EventRegistry;
/// use photosite::events::listeners::LoggingListener;
///
/// let mut registry = EventRegistry::new();
/// registry.listen(LoggingListener::new());
/// ```
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// Creates a new logging listener at INFO level.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    /// Creates a new logging listener at the specified level.
    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, length: &SessionLength) {
        log::log!(
            target: "photosite::events",
            self.level,
            "msg=\"session ended\", username={}, start={}, duration_secs={}",
            length.username,
            length.start.to_rfc3339(),
            length.duration.num_seconds()
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn test_logging_listener_default() {
        let listener = LoggingListener::default();
        assert_eq!(listener.level, log::Level::Info);
    }

    #[test]
    fn test_logging_listener_with_level() {
        let listener = LoggingListener::with_level(log::Level::Debug);
        assert_eq!(listener.level, log::Level::Debug);
    }

    #[tokio::test]
    async fn test_logging_listener_handle() {
        let listener = LoggingListener::new();
        let length = SessionLength {
            username: "alice".to_owned(),
            start: Utc::now(),
            duration: Duration::minutes(12),
        };

        // should not panic
        listener.handle(&length).await;
    }
}
