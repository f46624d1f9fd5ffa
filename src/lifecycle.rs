//! The record lifecycle: `Active <-> Inactive`, and `Active|Inactive -> Removed`
//! (terminal). Removed rows stay on disk but disappear from listings and no
//! longer block their key from being reused.
//!
//! `Lifecycle` is the caller-facing layer above `Store`: it validates input,
//! enforces uniqueness on create, carries status across edits and reports
//! missing keys instead of silently doing nothing.

use tracing::{info, warn};

use crate::db::{Database, Record, Store};
use crate::error::{DeskError, Result};
use crate::models::{SortKey, Status};

pub struct Lifecycle<E> {
    store: Store<E>,
}

impl<E: Record> Lifecycle<E> {
    pub(crate) fn new(db: Database) -> Self {
        Self {
            store: Store::new(db),
        }
    }

    pub(crate) fn store(&self) -> &Store<E> {
        &self.store
    }

    pub(crate) fn revision(&self) -> u64 {
        self.store.database().revision()
    }

    /// Visible records. A blank search lists everything in `sort` order; a
    /// non-blank search matches key and text columns and is always ordered by
    /// key, ignoring `sort`.
    pub fn list(&self, search: &str, sort: SortKey) -> Result<Vec<E>> {
        let search = search.trim();
        if search.is_empty() {
            Ok(self.store.get_all(sort)?)
        } else {
            Ok(self.store.search(search)?)
        }
    }

    /// Lookup by key, including removed records.
    pub fn get(&self, key: &str) -> Result<Option<E>> {
        Ok(self.store.get_by_key(key.trim())?)
    }

    /// Whether an active or inactive record holds `key`.
    pub fn code_exists(&self, key: &str) -> Result<bool> {
        Ok(self
            .store
            .get_by_key(key.trim())?
            .is_some_and(|record| !record.status().is_removed()))
    }

    /// Store a brand-new record as `Active`. A removed record with the same
    /// key is overwritten; a live one makes this fail with `DuplicateKey`.
    /// Surrounding whitespace is trimmed from every field, key included.
    pub fn create(&self, mut record: E) -> Result<E> {
        record.trim_fields();
        validate(&record)?;
        if self.code_exists(record.key())? {
            warn!(kind = %E::KIND, key = record.key(), "rejected duplicate key");
            return Err(DeskError::DuplicateKey {
                kind: E::KIND,
                key: record.key().to_string(),
            });
        }

        record.set_status(Status::Active);
        self.store.insert(&record)?;
        info!(kind = %E::KIND, key = record.key(), "created record");
        Ok(record)
    }

    /// Replace the non-key attributes of a live record. The stored status is
    /// kept whatever the incoming record says.
    pub fn modify(&self, mut record: E) -> Result<E> {
        record.trim_fields();
        validate(&record)?;
        let current = self.live(record.key())?;
        record.set_status(current.status());

        if self.store.update(&record)? == 0 {
            return Err(DeskError::not_found(E::KIND, record.key()));
        }
        info!(kind = %E::KIND, key = record.key(), "updated record");
        Ok(record)
    }

    /// Logical delete.
    pub fn remove(&self, key: &str) -> Result<()> {
        self.transition(key, Status::Removed)
    }

    pub fn deactivate(&self, key: &str) -> Result<()> {
        self.transition(key, Status::Inactive)
    }

    pub fn reactivate(&self, key: &str) -> Result<()> {
        self.transition(key, Status::Active)
    }

    fn transition(&self, key: &str, status: Status) -> Result<()> {
        let key = key.trim();
        let current = self.live(key)?;
        if self.store.set_status(key, status)? == 0 {
            return Err(DeskError::not_found(E::KIND, key));
        }
        info!(
            kind = %E::KIND,
            key,
            from = %current.status(),
            to = %status,
            "changed record status"
        );
        Ok(())
    }

    /// The record behind `key`, unless it is absent or removed.
    fn live(&self, key: &str) -> Result<E> {
        match self.store.get_by_key(key)? {
            Some(record) if !record.status().is_removed() => Ok(record),
            _ => {
                warn!(kind = %E::KIND, key, "no live record");
                Err(DeskError::not_found(E::KIND, key))
            }
        }
    }
}

fn validate<E: Record>(record: &E) -> Result<()> {
    for (field, value) in record.required_fields() {
        if value.trim().is_empty() {
            return Err(DeskError::blank(field));
        }
    }
    Ok(())
}
