//! Session length events.
//!
//! Every session that ends, whether by logout or expiry, is reported once as
//! a [`SessionLength`]. Repositories publish through a [`LengthSink`]; when no
//! consumer is attached the events are simply dropped.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use photosite::events::listeners::LoggingListener;
//! use photosite::{EventRegistry, LengthSink, SessionConfig, open_repository};
//!
//! let config = SessionConfig::default();
//! let (sink, lengths) = LengthSink::channel(config.event_buffer);
//! let sessions = open_repository(&config, sink)?;
//!
//! let mut registry = EventRegistry::new();
//! registry.listen(LoggingListener::new());
//! tokio::spawn(registry.run(lengths));
//! ```
//!
//! # Custom Listeners
//!
//! ```rust,ignore
//! use photosite::events::{Listener, SessionLength};
//! use async_trait::async_trait;
//!
//! struct HistogramListener;
//!
//! #[async_trait]
//! impl Listener for HistogramListener {
//!     async fn handle(&self, length: &SessionLength) {
//!         // observe length.duration
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;
mod sink;

pub mod listeners;

pub use event::SessionLength;
pub use listener::Listener;
pub use registry::EventRegistry;
pub use sink::LengthSink;
