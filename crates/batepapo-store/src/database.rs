//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. The server opens exactly
//! one handle at startup and closes it on shutdown.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::Result;
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the store named `name` inside directory `dir`.
    ///
    /// The database file is `<dir>/<name>.db`; `dir` is created if missing.
    pub fn open(dir: &Path, name: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let db_path = dir.join(format!("{name}.db"));

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit file path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Open a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database, `None` for in-memory
    /// databases.
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    /// Close the connection, flushing pending writes.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = dir.path().join("nested");

        let db = Database::open(&store_dir, "batepapo").expect("should open");
        let path = db.path().expect("file-backed");
        assert!(path.ends_with("batepapo.db"));
        assert!(store_dir.join("batepapo.db").exists());
        db.close().unwrap();
    }

    #[test]
    fn reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = Database::open(dir.path(), "chat").unwrap();
            assert!(db
                .insert_participant_if_absent(&crate::Participant::new("Ana", 1))
                .unwrap());
            db.close().unwrap();
        }
        let db = Database::open(dir.path(), "chat").unwrap();
        assert_eq!(db.list_participants().unwrap().len(), 1);
    }
}
