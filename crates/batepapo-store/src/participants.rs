//! Typed operations on the `participants` collection.

use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;
use crate::{Message, Participant};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert `participant` unless the name is already taken.
    ///
    /// Returns `false` when an active participant with the same name exists.
    /// Uniqueness is enforced by the primary key, so concurrent registrations
    /// of one name cannot both succeed.
    pub fn insert_participant_if_absent(&self, participant: &Participant) -> Result<bool> {
        let affected = self.conn().execute(
            "INSERT OR IGNORE INTO participants (name, last_status) VALUES (?1, ?2)",
            params![participant.name, participant.last_status],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_participant(&self, name: &str) -> Result<Option<Participant>> {
        let participant = self
            .conn()
            .query_row(
                "SELECT name, last_status FROM participants WHERE name = ?1",
                params![name],
                row_to_participant,
            )
            .optional()?;
        Ok(participant)
    }

    pub fn list_participants(&self) -> Result<Vec<Participant>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT name, last_status FROM participants ORDER BY name ASC")?;
        let rows = stmt.query_map([], row_to_participant)?;

        let mut participants = Vec::new();
        for row in rows {
            participants.push(row?);
        }
        Ok(participants)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Record a heartbeat. Returns `false` when no participant has that name.
    pub fn touch_participant(&self, name: &str, last_status: i64) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE participants SET last_status = ?2 WHERE name = ?1",
            params![name, last_status],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Remove every participant whose last heartbeat is strictly older than
    /// `cutoff`, append one leave notice stamped `time` for each of them and
    /// return the removed rows.
    ///
    /// Selection, deletion and the notices share one transaction: either all
    /// of them are committed or none is.
    pub fn evict_stale_participants(&self, cutoff: i64, time: &str) -> Result<Vec<Participant>> {
        let tx = self.conn().unchecked_transaction()?;

        let mut stale = Vec::new();
        {
            let mut stmt = tx.prepare(
                "SELECT name, last_status FROM participants
                 WHERE last_status < ?1
                 ORDER BY name ASC",
            )?;
            let rows = stmt.query_map(params![cutoff], row_to_participant)?;
            for row in rows {
                stale.push(row?);
            }
        }

        if !stale.is_empty() {
            tx.execute(
                "DELETE FROM participants WHERE last_status < ?1",
                params![cutoff],
            )?;
            for participant in &stale {
                self.insert_message(&Message::leave_notice(&participant.name, time.to_string()))?;
            }
        }

        tx.commit()?;
        Ok(stale)
    }
}

fn row_to_participant(row: &rusqlite::Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        name: row.get(0)?,
        last_status: row.get(1)?,
    })
}
