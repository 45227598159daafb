//! Message log service: client posts and per-participant reads.

use batepapo_shared::visibility::visible_messages;
use batepapo_shared::{Message, MessageType, ValidationError};
use serde::Deserialize;

use crate::error::ServerError;
use crate::store::ChatStore;

/// Body of `POST /messages`. Every field is optional at the parsing stage so
/// that missing fields surface as validation errors.
#[derive(Debug, Default, Deserialize)]
pub struct NewMessage {
    pub to: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl NewMessage {
    /// Turn the request into a log entry from `from`.
    fn into_message(self, from: &str, time: String) -> Result<Message, ValidationError> {
        let to = non_empty(self.to, "to")?;
        let text = non_empty(self.text, "text")?;
        let kind = MessageType::from_client(self.kind.as_deref().unwrap_or_default())?;

        let message = Message {
            from: from.to_string(),
            to,
            text,
            kind,
            time,
        };
        message.validate()?;
        Ok(message)
    }
}

fn non_empty(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::EmptyField(field))
}

/// Append a client message from `from`, who must be an active participant.
pub async fn post(
    store: &ChatStore,
    from: &str,
    request: NewMessage,
    time: String,
) -> Result<(), ServerError> {
    let message = request.into_message(from, time)?;

    let sender = from.to_string();
    let known = store
        .run("post_message", move |db| {
            if db.get_participant(&sender)?.is_none() {
                return Ok(false);
            }
            db.insert_message(&message)?;
            Ok(true)
        })
        .await?;

    if !known {
        return Err(ServerError::Validation(format!("unknown sender {from:?}")));
    }
    Ok(())
}

/// Messages `requester` may read, oldest first, optionally only the last
/// `limit` of them.
pub async fn visible_to(
    store: &ChatStore,
    requester: &str,
    limit: Option<usize>,
) -> Result<Vec<Message>, ServerError> {
    let log = store.run("list_messages", |db| db.list_messages()).await?;
    Ok(visible_messages(log, requester, limit))
}
