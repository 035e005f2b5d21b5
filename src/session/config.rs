use std::path::PathBuf;

use chrono::Duration;

use crate::crypto::DEFAULT_KEY_LENGTH;

/// Where sessions are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionBackend {
    /// In process memory; every session is lost on restart.
    #[default]
    Memory,
    /// A single database file at the given path.
    Disk(PathBuf),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Random bytes per session token.
    pub key_length: usize,
    /// Sessions idle for longer than this are expired.
    pub idle_timeout: Duration,
    /// Sessions older than this are expired regardless of activity.
    pub max_lifetime: Duration,
    /// How often the sweeper runs.
    pub sweep_interval: Duration,
    pub backend: SessionBackend,
    /// Capacity of the session length channel.
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key_length: DEFAULT_KEY_LENGTH,
            idle_timeout: Duration::hours(2),
            max_lifetime: Duration::hours(24),
            sweep_interval: Duration::minutes(1),
            backend: SessionBackend::Memory,
            event_buffer: 1024,
        }
    }
}

impl SessionConfig {
    /// Default timeouts with sessions persisted to `path`.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: SessionBackend::Disk(path.into()),
            ..Default::default()
        }
    }

    /// In-memory sessions with short timeouts for local work.
    pub fn development() -> Self {
        Self {
            idle_timeout: Duration::minutes(30),
            max_lifetime: Duration::hours(2),
            sweep_interval: Duration::seconds(10),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.key_length < 16 {
            return Err("key_length should be at least 16 bytes");
        }
        if self.idle_timeout <= Duration::zero() {
            return Err("idle_timeout must be positive");
        }
        if self.max_lifetime < self.idle_timeout {
            return Err("max_lifetime must not be shorter than idle_timeout");
        }
        if self.sweep_interval < Duration::seconds(1) {
            return Err("sweep_interval should be at least one second");
        }
        if self.event_buffer == 0 {
            return Err("event_buffer must not be zero");
        }
        Ok(())
    }
}
