//! Session management for the photosite gallery.
//!
//! Issues unforgeable session tokens, maps them to authenticated usernames,
//! and expires them on idle and absolute lifetimes. Two interchangeable
//! backends implement [`SessionRepository`]: an in-memory table and a
//! disk-backed store that batches activity updates until the next sweep.

pub mod actions;
pub mod crypto;
pub mod events;
pub mod session;
pub mod sweeper;

pub use events::{EventRegistry, LengthSink, Listener, SessionLength};
pub use session::{
    DiskSessionRepository, InMemorySessionRepository, SessionBackend, SessionConfig,
    SessionRepository, open_repository,
};
pub use sweeper::{SweeperHandle, spawn_sweeper};

use std::fmt;

use session::CodecError;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The random source failed; no session was issued.
    Entropy(String),
    /// A stored record could not be decoded.
    Corrupt(String),
    /// A record could not be encoded for storage.
    Encode(String),
    /// The backing file or table could not be opened.
    StorageUnavailable(String),
    DatabaseError(String),
    LockPoisoned,
    /// The repository was closed.
    Closed,
    InvalidConfig(&'static str),
}

impl std::error::Error for SessionError {}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Entropy(msg) => write!(f, "Failed to gather entropy: {}", msg),
            SessionError::Corrupt(msg) => write!(f, "Corrupt session record: {}", msg),
            SessionError::Encode(msg) => write!(f, "Failed to encode session record: {}", msg),
            SessionError::StorageUnavailable(msg) => write!(f, "Session storage unavailable: {}", msg),
            SessionError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            SessionError::LockPoisoned => write!(f, "Session lock poisoned"),
            SessionError::Closed => write!(f, "Session repository is closed"),
            SessionError::InvalidConfig(msg) => write!(f, "Invalid session config: {}", msg),
        }
    }
}

impl From<CodecError> for SessionError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::TimestampOutOfRange => SessionError::Encode(err.to_string()),
            CodecError::TooShort { .. } | CodecError::InvalidUsername => {
                SessionError::Corrupt(err.to_string())
            }
        }
    }
}
