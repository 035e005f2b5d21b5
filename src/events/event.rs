use chrono::{DateTime, Duration, Utc};

/// How long one session lasted, reported when it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLength {
    pub username: String,
    /// When the session was created.
    pub start: DateTime<Utc>,
    /// Time from creation to the last recorded activity.
    pub duration: Duration,
}

impl SessionLength {
    /// Returns the last recorded activity of the session.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.duration
    }
}
