//! Per-participant view of the message log.
//!
//! A participant sees broadcast messages and messages addressed to them by
//! name. An optional limit keeps only the most recent entries; the result is
//! always oldest-first.

use crate::constants::BROADCAST;
use crate::error::ValidationError;
use crate::types::Message;

/// Whether `requester` may read `message`.
pub fn is_visible_to(message: &Message, requester: &str) -> bool {
    message.to == requester || message.to == BROADCAST
}

/// Messages visible to `requester`, in log order, truncated to the last
/// `limit` entries when a limit is given.
pub fn visible_messages<I>(log: I, requester: &str, limit: Option<usize>) -> Vec<Message>
where
    I: IntoIterator<Item = Message>,
{
    let mut visible: Vec<Message> = log
        .into_iter()
        .filter(|m| is_visible_to(m, requester))
        .collect();

    if let Some(limit) = limit {
        let skip = visible.len().saturating_sub(limit);
        visible.drain(..skip);
    }

    visible
}

/// Parse the `limit` query parameter. Absent means no limit; anything other
/// than a positive integer is rejected.
pub fn parse_limit(raw: Option<&str>) -> Result<Option<usize>, ValidationError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(ValidationError::InvalidLimit(raw.to_string())),
        Ok(n) => Ok(Some(n)),
    }
}
