mod codec;
mod config;
mod disk_store;
mod memory_store;
mod repository;

use std::sync::Arc;

use chrono::{DateTime, Utc};
pub use codec::CodecError;
pub use config::{SessionBackend, SessionConfig};
pub use disk_store::DiskSessionRepository;
pub use memory_store::InMemorySessionRepository;
pub use repository::SessionRepository;

use crate::SessionError;
use crate::events::{LengthSink, SessionLength};

/// State held for one live session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionRecord {
    pub username: String,
    pub created: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(username: &str, now: DateTime<Utc>) -> Self {
        Self {
            username: username.to_owned(),
            created: now,
            last_active: now,
        }
    }

    /// Records activity at `at`. Never moves `last_active` backwards.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_active {
            self.last_active = at;
        }
    }

    /// True when idle since before `update` or created before `create`.
    pub fn is_expired(&self, update: DateTime<Utc>, create: DateTime<Utc>) -> bool {
        self.last_active < update || self.created < create
    }

    pub fn length(&self) -> SessionLength {
        SessionLength {
            username: self.username.clone(),
            start: self.created,
            duration: self.last_active - self.created,
        }
    }
}

/// Opens the repository selected by `config.backend`.
///
/// # Errors
///
/// Returns `SessionError::InvalidConfig` if the config does not validate and
/// `SessionError::StorageUnavailable` if the disk store cannot be opened.
///
/// # Example
///
/// ```rust,ignore
/// use photosite::{LengthSink, SessionConfig, open_repository};
///
/// let config = SessionConfig::persistent("/var/lib/photosite/sessions.redb");
/// let (sink, lengths) = LengthSink::channel(config.event_buffer);
/// let sessions = open_repository(&config, sink)?;
/// ```
pub fn open_repository(
    config: &SessionConfig,
    length: LengthSink,
) -> Result<Arc<dyn SessionRepository>, SessionError> {
    config.validate().map_err(SessionError::InvalidConfig)?;

    log::debug!(
        target: "photosite::session",
        "msg=\"opening session repository\", persistent={}, length_events={}",
        matches!(config.backend, SessionBackend::Disk(_)),
        length.is_enabled()
    );

    match &config.backend {
        SessionBackend::Memory => Ok(Arc::new(InMemorySessionRepository::new(
            config.key_length,
            length,
        ))),
        SessionBackend::Disk(path) => Ok(Arc::new(DiskSessionRepository::open(
            path,
            config.key_length,
            length,
        )?)),
    }
}
