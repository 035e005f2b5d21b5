use tokio::sync::mpsc;

use super::{Listener, SessionLength};

/// Listeners fed from a [`LengthSink`](super::LengthSink) channel.
#[derive(Default)]
pub struct EventRegistry {
    listeners: Vec<Box<dyn Listener>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener to receive events.
    ///
    /// Listeners are called in the order they are registered.
    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub async fn dispatch(&self, length: &SessionLength) {
        for listener in &self.listeners {
            listener.handle(length).await;
        }
    }

    /// Dispatches every received event until all sinks are dropped.
    ///
    /// Returns the number of events handled.
    pub async fn run(self, mut lengths: mpsc::Receiver<SessionLength>) -> u64 {
        let mut handled = 0u64;
        while let Some(length) = lengths.recv().await {
            self.dispatch(&length).await;
            handled += 1;
        }
        log::debug!(
            target: "photosite::events",
            "msg=\"length channel closed\", handled={handled}"
        );
        handled
    }
}
