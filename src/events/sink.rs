use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::SessionLength;

/// Outbound end of the session length channel.
///
/// Publishing never blocks: if the channel is full or its receiver has gone,
/// the event is dropped. A disabled sink publishes nothing.
#[derive(Debug, Clone, Default)]
pub struct LengthSink {
    tx: Option<mpsc::Sender<SessionLength>>,
}

impl LengthSink {
    /// Creates a sink and the receiver its events arrive on.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SessionLength>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink with no consumer attached.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub fn publish(&self, length: SessionLength) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(length) {
            Ok(()) => {}
            Err(TrySendError::Full(length)) => {
                log::warn!(
                    target: "photosite::events",
                    "msg=\"length channel full, event dropped\", username={}",
                    length.username
                );
            }
            Err(TrySendError::Closed(_)) => {
                log::debug!(
                    target: "photosite::events",
                    "msg=\"length channel closed, event dropped\""
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn length() -> SessionLength {
        SessionLength {
            username: "alice".to_owned(),
            start: Utc::now(),
            duration: Duration::seconds(30),
        }
    }

    #[test]
    fn test_disabled_sink_is_noop() {
        let sink = LengthSink::disabled();
        assert!(!sink.is_enabled());
        sink.publish(length());
    }

    #[test]
    fn test_publish_delivers() {
        let (sink, mut rx) = LengthSink::channel(4);
        assert!(sink.is_enabled());

        let event = length();
        sink.publish(event.clone());
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn test_full_channel_drops_instead_of_blocking() {
        let (sink, mut rx) = LengthSink::channel(1);
        sink.publish(length());
        sink.publish(length());

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_channel_drops() {
        let (sink, rx) = LengthSink::channel(1);
        drop(rx);
        sink.publish(length());
    }
}
