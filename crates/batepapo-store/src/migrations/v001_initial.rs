//! v001 -- Initial schema creation.
//!
//! Creates the `participants` and `messages` collections.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Participants
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS participants (
    name        TEXT PRIMARY KEY NOT NULL,    -- unique while active
    last_status INTEGER NOT NULL              -- ms since Unix epoch
);

CREATE INDEX IF NOT EXISTS idx_participants_last_status
    ON participants(last_status);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
    sender     TEXT NOT NULL,
    recipient  TEXT NOT NULL,                      -- 'Todos' or a name
    text       TEXT NOT NULL,
    kind       TEXT NOT NULL
               CHECK (kind IN ('message', 'private_message', 'status')),
    time       TEXT NOT NULL                       -- HH:MM:SS, display only
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
