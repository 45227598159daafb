use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{BROADCAST, JOIN_TEXT, LEAVE_TEXT};
use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// An active chat participant. The name is unique while the participant is
/// registered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    /// Milliseconds since the Unix epoch of the last heartbeat (or of the
    /// registration itself).
    pub last_status: i64,
}

impl Participant {
    pub fn new(name: impl Into<String>, last_status: i64) -> Self {
        Self {
            name: name.into(),
            last_status,
        }
    }
}

/// Trim a requested display name, rejecting names that are blank.
pub fn normalize_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyField("name"));
    }
    Ok(name.to_string())
}

// ---------------------------------------------------------------------------
// Message type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Public message.
    Message,
    /// Message scoped to one recipient.
    PrivateMessage,
    /// System-generated join/leave notice.
    Status,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::PrivateMessage => "private_message",
            Self::Status => "status",
        }
    }

    /// Parse a type submitted by a client. `status` is reserved for the
    /// server and rejected here.
    pub fn from_client(s: &str) -> Result<Self, ValidationError> {
        match s.parse::<Self>()? {
            Self::Status => Err(ValidationError::UnsupportedType(s.to_string())),
            other => Ok(other),
        }
    }
}

impl FromStr for MessageType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(Self::Message),
            "private_message" => Ok(Self::PrivateMessage),
            "status" => Ok(Self::Status),
            other => Err(ValidationError::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message. Immutable once appended to the log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub from: String,
    /// Either [`BROADCAST`] or the name of a single participant.
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Display-only `HH:MM:SS` wall-clock time, see [`crate::clock`].
    pub time: String,
}

impl Message {
    /// Broadcast notice announcing that `name` joined.
    pub fn join_notice(name: &str, time: String) -> Self {
        Self::status(name, JOIN_TEXT, time)
    }

    /// Broadcast notice announcing that `name` left.
    pub fn leave_notice(name: &str, time: String) -> Self {
        Self::status(name, LEAVE_TEXT, time)
    }

    fn status(name: &str, text: &str, time: String) -> Self {
        Self {
            from: name.to_string(),
            to: BROADCAST.to_string(),
            text: text.to_string(),
            kind: MessageType::Status,
            time,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.to == BROADCAST
    }

    /// Check the record-level invariants every stored message satisfies.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.from.is_empty() {
            return Err(ValidationError::EmptyField("from"));
        }
        if self.to.is_empty() {
            return Err(ValidationError::EmptyField("to"));
        }
        if self.text.is_empty() {
            return Err(ValidationError::EmptyField("text"));
        }
        if self.kind == MessageType::Status {
            if self.text != JOIN_TEXT && self.text != LEAVE_TEXT {
                return Err(ValidationError::InvalidStatusText(self.text.clone()));
            }
            if !self.is_broadcast() {
                return Err(ValidationError::StatusNotBroadcast);
            }
        }
        Ok(())
    }
}
