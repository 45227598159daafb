use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::{Message, MessageType};

impl Database {
    /// Append `message` to the log after checking its invariants.
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        message.validate()?;
        self.conn().execute(
            "INSERT INTO messages (sender, recipient, text, kind, time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                message.from,
                message.to,
                message.text,
                message.kind.as_str(),
                message.time,
            ],
        )?;
        Ok(())
    }

    /// The full log, oldest first.
    pub fn list_messages(&self) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT sender, recipient, text, kind, time
             FROM messages
             ORDER BY seq ASC",
        )?;

        let rows = stmt.query_map([], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Number of messages in the log.
    pub fn count_messages(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let kind_str: String = row.get(3)?;
    let kind = kind_str.parse::<MessageType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Message {
        from: row.get(0)?,
        to: row.get(1)?,
        text: row.get(2)?,
        kind,
        time: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;

    fn chat(from: &str, to: &str, text: &str, kind: MessageType) -> Message {
        Message {
            from: from.into(),
            to: to.into(),
            text: text.into(),
            kind,
            time: "09:30:00".into(),
        }
    }

    #[test]
    fn test_messages_keep_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        let first = Message::join_notice("Ana", "09:29:59".into());
        let second = chat("Ana", "Todos", "oi", MessageType::Message);
        let third = chat("Bia", "Ana", "psiu", MessageType::PrivateMessage);

        for m in [&first, &second, &third] {
            db.insert_message(m).unwrap();
        }

        assert_eq!(db.list_messages().unwrap(), vec![first, second, third]);
        assert_eq!(db.count_messages().unwrap(), 3);
    }

    #[test]
    fn test_invalid_message_is_not_inserted() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .insert_message(&chat("Ana", "Todos", "", MessageType::Message))
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));

        let err = db
            .insert_message(&chat("Ana", "Todos", "whatever", MessageType::Status))
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));

        assert_eq!(db.count_messages().unwrap(), 0);
    }
}
