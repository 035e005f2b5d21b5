//! Binary layout of a stored session record.
//!
//! ```text
//! [0..8)   last_active  i64 nanoseconds since the Unix epoch, big-endian
//! [8..16)  created      i64 nanoseconds since the Unix epoch, big-endian
//! [16..)   username     UTF-8, runs to the end of the value
//! ```

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

use super::SessionRecord;

/// Width of one encoded timestamp.
pub(crate) const TIMESTAMP_LEN: usize = 8;

const HEADER_LEN: usize = 2 * TIMESTAMP_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The instant cannot be expressed as i64 nanoseconds.
    TimestampOutOfRange,
    TooShort { len: usize },
    InvalidUsername,
}

impl std::error::Error for CodecError {}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::TimestampOutOfRange => write!(f, "timestamp out of range"),
            CodecError::TooShort { len } => {
                write!(f, "record is {} bytes, need at least {}", len, HEADER_LEN)
            }
            CodecError::InvalidUsername => write!(f, "username is not valid UTF-8"),
        }
    }
}

pub(crate) fn encode(record: &SessionRecord) -> Result<Vec<u8>, CodecError> {
    let last_active = encode_timestamp(record.last_active)?;
    let created = encode_timestamp(record.created)?;

    let mut buf = Vec::with_capacity(HEADER_LEN + record.username.len());
    buf.extend_from_slice(&last_active);
    buf.extend_from_slice(&created);
    buf.extend_from_slice(record.username.as_bytes());
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<SessionRecord, CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::TooShort { len: bytes.len() });
    }
    let (last_active, rest) = bytes.split_at(TIMESTAMP_LEN);
    let (created, username) = rest.split_at(TIMESTAMP_LEN);

    let username = std::str::from_utf8(username).map_err(|_| CodecError::InvalidUsername)?;

    Ok(SessionRecord {
        username: username.to_owned(),
        created: decode_timestamp(created),
        last_active: decode_timestamp(last_active),
    })
}

fn encode_timestamp(at: DateTime<Utc>) -> Result<[u8; TIMESTAMP_LEN], CodecError> {
    at.timestamp_nanos_opt()
        .map(i64::to_be_bytes)
        .ok_or(CodecError::TimestampOutOfRange)
}

fn decode_timestamp(bytes: &[u8]) -> DateTime<Utc> {
    let mut raw = [0u8; TIMESTAMP_LEN];
    raw.copy_from_slice(bytes);
    Utc.timestamp_nanos(i64::from_be_bytes(raw))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn record(username: &str) -> SessionRecord {
        let created = Utc::now();
        SessionRecord {
            username: username.to_owned(),
            created,
            last_active: created + Duration::minutes(90),
        }
    }

    #[test]
    fn test_decode_reverses_encode() {
        let stored = record("Bob");
        let bytes = encode(&stored).unwrap();
        assert_eq!(decode(&bytes).unwrap(), stored);
    }

    #[test]
    fn test_encoded_length() {
        let stored = record("usernameA");
        let bytes = encode(&stored).unwrap();
        assert_eq!(bytes.len(), 2 * TIMESTAMP_LEN + "usernameA".len());
    }

    #[test]
    fn test_field_order() {
        let stored = record("x");
        let bytes = encode(&stored).unwrap();

        let last_active = stored.last_active.timestamp_nanos_opt().unwrap();
        let created = stored.created.timestamp_nanos_opt().unwrap();
        assert_eq!(&bytes[..8], &last_active.to_be_bytes());
        assert_eq!(&bytes[8..16], &created.to_be_bytes());
        assert_eq!(&bytes[16..], b"x");
    }

    #[test]
    fn test_empty_and_multibyte_usernames() {
        for name in ["", "zoë", "写真"] {
            let stored = record(name);
            assert_eq!(decode(&encode(&stored).unwrap()).unwrap(), stored);
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let stored = record("alice");
        assert_eq!(encode(&stored).unwrap(), encode(&stored).unwrap());
    }

    #[test]
    fn test_pre_epoch_timestamps() {
        let created = Utc.with_ymd_and_hms(1969, 7, 20, 20, 17, 40).unwrap();
        let stored = SessionRecord {
            username: "armstrong".to_owned(),
            created,
            last_active: created + Duration::hours(2),
        };
        assert_eq!(decode(&encode(&stored).unwrap()).unwrap(), stored);
    }

    #[test]
    fn test_decode_too_short() {
        assert_eq!(decode(&[0u8; 15]), Err(CodecError::TooShort { len: 15 }));
        assert_eq!(decode(&[]), Err(CodecError::TooShort { len: 0 }));
    }

    #[test]
    fn test_decode_invalid_username() {
        let mut bytes = encode(&record("alice")).unwrap();
        bytes.push(0xff);
        assert_eq!(decode(&bytes), Err(CodecError::InvalidUsername));
    }

    #[test]
    fn test_encode_out_of_range() {
        let mut stored = record("alice");
        stored.created = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap();
        stored.last_active = stored.created;
        assert_eq!(encode(&stored), Err(CodecError::TimestampOutOfRange));
    }
}
