use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

/// Shared handle to the embedded SQLite database.
///
/// The handle is constructed once at startup and cloned into every store,
/// engine and composer that needs it; clones share one connection. It also
/// carries a write revision that stores bump after each successful write,
/// which projections use as their change notification.
#[derive(Clone)]
pub struct Database {
    inner: Rc<Inner>,
}

struct Inner {
    conn: Connection,
    revision: Cell<u64>,
}

impl Database {
    /// Open (or create) the database file at `path`, creating parent
    /// directories as needed, and make sure all tables exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }

        let conn = Connection::open(path).context("failed to open SQLite database")?;
        debug!(path = %path.display(), "opened database");
        Self::from_connection(conn)
    }

    /// Throwaway database used by tests and demos.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        ensure_schema(&conn)?;
        Ok(Self {
            inner: Rc::new(Inner {
                conn,
                revision: Cell::new(0),
            }),
        })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.inner.conn
    }

    /// Number of writes committed through this handle so far.
    pub fn revision(&self) -> u64 {
        self.inner.revision.get()
    }

    pub(crate) fn touch(&self) {
        self.inner.revision.set(self.inner.revision.get() + 1);
    }
}

/// Create the four registry tables when missing. Ticket references are plain
/// text columns: they are validated when a ticket is saved, and no cascade
/// applies when the referenced record later changes state.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    for table in ["faculties", "programs", "students"] {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    code TEXT PRIMARY KEY NOT NULL,
                    name TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'A'
                )"
            ),
            [],
        )
        .with_context(|| format!("failed to create {table} table"))?;
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS tickets (
            ticket_number TEXT PRIMARY KEY NOT NULL,
            date TEXT NOT NULL,
            student_code TEXT NOT NULL,
            faculty_code TEXT NOT NULL,
            program_code TEXT NOT NULL,
            description TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'A'
        )",
        [],
    )
    .context("failed to create tickets table")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creation_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(db.conn()).unwrap();

        let tables: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('faculties', 'programs', 'students', 'tickets')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn clones_share_the_revision() {
        let db = Database::open_in_memory().unwrap();
        let other = db.clone();
        assert_eq!(db.revision(), 0);
        other.touch();
        assert_eq!(db.revision(), 1);
    }
}
