use std::marker::PhantomData;

use anyhow::{Context, Result};
use rusqlite::types::ToSql;
use rusqlite::{params, OptionalExtension};

use super::connection::Database;
use super::record::Record;
use crate::models::{SortKey, Status};

/// Table-level access for one entity kind.
///
/// This layer is permissive: `insert` is an upsert and the
/// update helpers report how many rows they touched instead of failing. The
/// stricter rules live in `Lifecycle`.
pub struct Store<E> {
    db: Database,
    _record: PhantomData<fn() -> E>,
}

impl<E> Clone for Store<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _record: PhantomData,
        }
    }
}

impl<E: Record> Store<E> {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Every non-removed record ordered by the requested column, with the key
    /// as tie-breaker.
    pub fn get_all(&self, sort: SortKey) -> Result<Vec<E>> {
        let order = match sort {
            SortKey::Code => E::key_column(),
            SortKey::Natural => E::NATURAL_COLUMN,
        };
        let sql = format!(
            "{} WHERE status != ?1 ORDER BY {order} ASC, {key} ASC",
            select_clause::<E>(),
            key = E::key_column(),
        );
        self.query(&sql, params![Status::Removed])
    }

    /// Point lookup by key. Removed records are returned too; callers decide
    /// whether a removed key counts.
    pub fn get_by_key(&self, key: &str) -> Result<Option<E>> {
        let sql = format!("{} WHERE {} = ?1", select_clause::<E>(), E::key_column());
        self.db
            .conn()
            .query_row(&sql, [key], E::from_row)
            .optional()
            .with_context(|| format!("failed to look up {} {key}", E::KIND))
    }

    /// Non-removed records whose key or search columns contain `text`
    /// (ASCII case-insensitive), ordered by key.
    pub fn search(&self, text: &str) -> Result<Vec<E>> {
        let filter = E::SEARCH_COLUMNS
            .iter()
            .map(|column| format!("{column} LIKE ?2 ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "{} WHERE status != ?1 AND ({filter}) ORDER BY {} ASC",
            select_clause::<E>(),
            E::key_column(),
        );
        let pattern = format!("%{}%", escape_like(text));
        self.query(&sql, params![Status::Removed, pattern])
    }

    /// Insert or replace by key, including whatever status the record carries.
    pub fn insert(&self, record: &E) -> Result<()> {
        let placeholders = (1..=E::COLUMNS.len())
            .map(|idx| format!("?{idx}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({placeholders})",
            E::TABLE,
            E::COLUMNS.join(", "),
        );
        self.db
            .conn()
            .execute(&sql, record.to_params().as_slice())
            .with_context(|| format!("failed to insert {} {}", E::KIND, record.key()))?;
        self.db.touch();
        Ok(())
    }

    /// Full-row replace by key. Returns the number of rows touched, which is
    /// zero when the key is absent.
    pub fn update(&self, record: &E) -> Result<usize> {
        let assignments = E::COLUMNS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, column)| format!("{column} = ?{}", idx + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {} = ?1",
            E::TABLE,
            E::key_column(),
        );
        let updated = self
            .db
            .conn()
            .execute(&sql, record.to_params().as_slice())
            .with_context(|| format!("failed to update {} {}", E::KIND, record.key()))?;
        if updated > 0 {
            self.db.touch();
        }
        Ok(updated)
    }

    /// Change only the status column. Returns the number of rows touched.
    pub fn set_status(&self, key: &str, status: Status) -> Result<usize> {
        let sql = format!(
            "UPDATE {} SET status = ?1 WHERE {} = ?2",
            E::TABLE,
            E::key_column(),
        );
        let updated = self
            .db
            .conn()
            .execute(&sql, params![status, key])
            .with_context(|| format!("failed to change status of {} {key}", E::KIND))?;
        if updated > 0 {
            self.db.touch();
        }
        Ok(updated)
    }

    /// Keys of every non-removed record, in no particular order.
    pub fn live_keys(&self) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE status != ?1",
            E::key_column(),
            E::TABLE
        );
        let mut stmt = self
            .db
            .conn()
            .prepare(&sql)
            .with_context(|| format!("failed to prepare {} key query", E::TABLE))?;

        let keys = stmt
            .query_map([Status::Removed], |row| row.get(0))
            .with_context(|| format!("failed to load {} keys", E::TABLE))?
            .collect::<Result<Vec<String>, _>>()
            .with_context(|| format!("failed to collect {} keys", E::TABLE))?;

        Ok(keys)
    }

    /// Row count regardless of status.
    pub fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", E::TABLE);
        let count: i64 = self
            .db
            .conn()
            .query_row(&sql, [], |row| row.get(0))
            .with_context(|| format!("failed to count {}", E::TABLE))?;
        Ok(count as usize)
    }

    fn query(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<E>> {
        let mut stmt = self
            .db
            .conn()
            .prepare(sql)
            .with_context(|| format!("failed to prepare {} query", E::TABLE))?;

        let records = stmt
            .query_map(params, E::from_row)
            .with_context(|| format!("failed to load {}", E::TABLE))?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("failed to collect {}", E::TABLE))?;

        Ok(records)
    }
}

fn select_clause<E: Record>() -> String {
    format!("SELECT {} FROM {}", E::COLUMNS.join(", "), E::TABLE)
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
