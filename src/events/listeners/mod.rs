//! Built-in event listeners.
//!
//! Register them on an [`EventRegistry`](crate::EventRegistry).

mod logging;
#[cfg(feature = "tracing")]
mod tracing;

pub use logging::LoggingListener;
#[cfg(feature = "tracing")]
pub use self::tracing::TracingListener;
