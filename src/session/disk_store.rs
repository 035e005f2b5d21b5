//! Disk-backed session storage.
//!
//! Sessions live in a single `redb` table keyed by the raw token bytes.
//! Reads do not write: [`has_key`](SessionRepository::has_key) only stages
//! the new activity time in memory, and the staged times are merged into the
//! durable records at the start of the next
//! [`expire_before`](SessionRepository::expire_before), inside the same
//! transaction that evicts.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, Table, TableDefinition};

use super::repository::SessionRepository;
use super::{SessionRecord, codec};
use crate::SessionError;
use crate::crypto::{decode_token, encode_token, generate_key};
use crate::events::{LengthSink, SessionLength};

const SESSION_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("session");

type SessionTable<'txn> = Table<'txn, &'static [u8], &'static [u8]>;

/// Activity times not yet written to disk, keyed by raw token bytes.
type PendingUpdates = HashMap<Vec<u8>, DateTime<Utc>>;

/// Records chosen for removal, with their keys.
type Selected = Vec<(Vec<u8>, SessionRecord)>;

/// Disk-backed session storage.
///
/// # Example
///
/// ```rust,ignore
/// use photosite::{DiskSessionRepository, LengthSink};
///
/// let repo = DiskSessionRepository::open("/var/lib/photosite/sessions.redb", 256, LengthSink::disabled())?;
/// ```
#[derive(Clone)]
pub struct DiskSessionRepository {
    inner: Arc<Inner>,
}

struct Inner {
    db: RwLock<Option<Database>>,
    updates: Mutex<PendingUpdates>,
    key_length: usize,
    length: LengthSink,
}

impl DiskSessionRepository {
    /// Opens or creates the session database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::StorageUnavailable` if the file cannot be opened
    /// or the session table cannot be created.
    pub fn open(
        path: impl AsRef<Path>,
        key_length: usize,
        length: LengthSink,
    ) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(|e| {
            SessionError::StorageUnavailable(format!(
                "Failed to open {}: {e}",
                path.display()
            ))
        })?;

        let txn = db.begin_write().map_err(|e| {
            SessionError::StorageUnavailable(format!("Failed to begin transaction: {e}"))
        })?;
        txn.open_table(SESSION_TABLE).map_err(|e| {
            SessionError::StorageUnavailable(format!("Failed to open session table: {e}"))
        })?;
        txn.commit().map_err(|e| {
            SessionError::StorageUnavailable(format!("Failed to create session table: {e}"))
        })?;

        log::info!(
            target: "photosite::session",
            "msg=\"session database opened\", path={}",
            path.display()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                db: RwLock::new(Some(db)),
                updates: Mutex::new(HashMap::with_capacity(10)),
                key_length,
                length,
            }),
        })
    }

    /// Returns the number of activity updates waiting for the next sweep.
    pub fn pending_updates(&self) -> usize {
        self.inner
            .updates
            .lock()
            .map(|guard| guard.len())
            .unwrap_or(0)
    }

    fn updates(&self) -> Result<MutexGuard<'_, PendingUpdates>, SessionError> {
        self.inner
            .updates
            .lock()
            .map_err(|_| SessionError::LockPoisoned)
    }

    /// Runs `f` against the open database.
    fn with_db<T>(
        &self,
        f: impl FnOnce(&Database) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let db = self
            .inner
            .db
            .read()
            .map_err(|_| SessionError::LockPoisoned)?;
        match db.as_ref() {
            Some(db) => f(db),
            None => Err(SessionError::Closed),
        }
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut SessionTable<'_>) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        self.with_db(|db| write_in(db, f))
    }

    /// Removes the given keys, returning the length of each removed session.
    ///
    /// Pending activity for those keys is folded into the reported length
    /// and discarded once the removal has committed.
    fn remove_keys(
        &self,
        select: impl FnOnce(&SessionTable<'_>) -> Result<Selected, SessionError>,
    ) -> Result<Vec<SessionLength>, SessionError> {
        let removed = self.write(|table| {
            let removed = select(table)?;
            for (key, _) in &removed {
                table.remove(key.as_slice()).map_err(storage_error)?;
            }
            Ok(removed)
        })?;

        // the records are gone, so report them even past a poisoned overlay
        let mut updates = self.inner.updates.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(removed
            .into_iter()
            .map(|(key, mut record)| {
                if let Some(at) = updates.remove(&key) {
                    record.touch(at);
                }
                record.length()
            })
            .collect())
    }

    /// Writes staged activity times into their durable records.
    fn merge(table: &mut SessionTable<'_>, pending: &PendingUpdates) -> Result<(), SessionError> {
        for (key, at) in pending {
            let existing = table
                .get(key.as_slice())
                .map_err(storage_error)?
                .map(|value| codec::decode(value.value()))
                .transpose()?;

            // deleted since it was read
            let Some(mut record) = existing else {
                continue;
            };
            record.touch(*at);

            let value = codec::encode(&record)?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(storage_error)?;
        }
        Ok(())
    }

    /// Takes every staged update, leaving the overlay empty.
    fn take_pending(&self) -> Result<PendingUpdates, SessionError> {
        Ok(std::mem::take(&mut *self.updates()?))
    }

    /// Puts back staged updates whose merge did not commit.
    fn restore_pending(&self, pending: PendingUpdates) {
        let Ok(mut updates) = self.inner.updates.lock() else {
            return;
        };
        for (key, at) in pending {
            updates
                .entry(key)
                .and_modify(|current| {
                    if at > *current {
                        *current = at;
                    }
                })
                .or_insert(at);
        }
    }

    fn publish_all(&self, lengths: Vec<SessionLength>) {
        for length in lengths {
            self.inner.length.publish(length);
        }
    }
}

/// Runs `f` inside one write transaction and commits if it succeeds.
///
/// Any error drops the transaction uncommitted.
fn write_in<T>(
    db: &Database,
    f: impl FnOnce(&mut SessionTable<'_>) -> Result<T, SessionError>,
) -> Result<T, SessionError> {
    let txn = db.begin_write().map_err(|e| {
        SessionError::DatabaseError(format!("Failed to begin transaction: {e}"))
    })?;
    let value = {
        let mut table = txn.open_table(SESSION_TABLE).map_err(|e| {
            SessionError::StorageUnavailable(format!("Failed to open session table: {e}"))
        })?;
        f(&mut table)?
    };
    txn.commit().map_err(|e| {
        SessionError::DatabaseError(format!("Failed to commit transaction: {e}"))
    })?;
    Ok(value)
}

fn storage_error(e: redb::StorageError) -> SessionError {
    SessionError::DatabaseError(format!("Storage error: {e}"))
}

/// Decodes every record in the table, keeping those `matches` selects.
fn scan(
    table: &SessionTable<'_>,
    matches: impl Fn(&SessionRecord) -> bool,
) -> Result<Selected, SessionError> {
    let mut selected = Vec::new();
    for entry in table.iter().map_err(storage_error)? {
        let (key, value) = entry.map_err(storage_error)?;
        let record = codec::decode(value.value())?;
        if matches(&record) {
            selected.push((key.value().to_vec(), record));
        }
    }
    Ok(selected)
}

#[async_trait]
impl SessionRepository for DiskSessionRepository {
    async fn has_key(&self, token: &str) -> Result<Option<String>, SessionError> {
        let Some(key) = decode_token(token) else {
            return Ok(None);
        };

        let record = self.with_db(|db| {
            let txn = db.begin_read().map_err(|e| {
                SessionError::DatabaseError(format!("Failed to begin transaction: {e}"))
            })?;
            let table = txn.open_table(SESSION_TABLE).map_err(|e| {
                SessionError::StorageUnavailable(format!("Failed to open session table: {e}"))
            })?;
            let value = table.get(key.as_slice()).map_err(storage_error)?;
            value
                .map(|value| codec::decode(value.value()))
                .transpose()
                .map_err(SessionError::from)
        })?;

        let Some(record) = record else {
            return Ok(None);
        };

        self.updates()?.insert(key, Utc::now());

        Ok(Some(record.username))
    }

    async fn insert(&self, username: &str) -> Result<String, SessionError> {
        let key = generate_key(self.inner.key_length)?;
        let value = codec::encode(&SessionRecord::new(username, Utc::now()))?;

        self.write(|table| {
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(storage_error)?;
            Ok(())
        })?;

        Ok(encode_token(&key))
    }

    async fn delete(&self, username: &str) -> Result<(), SessionError> {
        let lengths =
            self.remove_keys(|table| scan(table, |record| record.username == username))?;

        log::debug!(
            target: "photosite::session",
            "msg=\"sessions deleted\", username={username}, removed={}",
            lengths.len()
        );

        self.publish_all(lengths);
        Ok(())
    }

    async fn delete_key(&self, token: &str) -> Result<(), SessionError> {
        let Some(key) = decode_token(token) else {
            return Ok(());
        };

        let lengths = self.remove_keys(|table| {
            let existing = table
                .get(key.as_slice())
                .map_err(storage_error)?
                .map(|value| codec::decode(value.value()))
                .transpose()?;
            Ok(existing.map(|record| (key.clone(), record)).into_iter().collect())
        })?;

        self.publish_all(lengths);
        Ok(())
    }

    async fn expire_before(
        &self,
        update: DateTime<Utc>,
        create: DateTime<Utc>,
    ) -> Result<u64, SessionError> {
        let mut taken = None;

        let result = self.write(|table| {
            let pending = taken.insert(self.take_pending()?);
            Self::merge(table, pending)?;

            let expired = scan(table, |record| record.is_expired(update, create))?;
            for (key, _) in &expired {
                table.remove(key.as_slice()).map_err(storage_error)?;
            }
            Ok(expired)
        });
        let merged = taken.as_ref().map_or(0, HashMap::len);

        let expired = match result {
            Ok(expired) => expired,
            Err(err) => {
                if let Some(pending) = taken {
                    self.restore_pending(pending);
                }
                log::error!(
                    target: "photosite::session",
                    "msg=\"session sweep aborted\", error={err}"
                );
                return Err(err);
            }
        };

        let removed = u64::try_from(expired.len()).unwrap_or(u64::MAX);
        log::debug!(
            target: "photosite::session",
            "msg=\"sessions swept\", merged={merged}, removed={removed}"
        );

        self.publish_all(expired.into_iter().map(|(_, record)| record.length()).collect());
        Ok(removed)
    }

    async fn close(&self) -> Result<(), SessionError> {
        let mut db = self
            .inner
            .db
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        let Some(open) = db.take() else {
            return Ok(());
        };

        let pending = self.take_pending()?;
        let flushed = if pending.is_empty() {
            Ok(())
        } else {
            write_in(&open, |table| Self::merge(table, &pending))
        };

        drop(open);
        log::info!(target: "photosite::session", "msg=\"session database closed\"");

        flushed.inspect_err(|err| {
            log::warn!(
                target: "photosite::session",
                "msg=\"pending activity lost on close\", count={}, error={err}",
                pending.len()
            );
        })
    }
}
