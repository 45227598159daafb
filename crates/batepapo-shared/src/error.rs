use thiserror::Error;

/// A chat record or request parameter that breaks a domain rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("Unsupported message type: {0}")]
    UnsupportedType(String),

    #[error("Not a join or leave notice: {0:?}")]
    InvalidStatusText(String),

    #[error("Status messages must be broadcast")]
    StatusNotBroadcast,

    #[error("Invalid limit: {0:?} (expected a positive integer)")]
    InvalidLimit(String),
}
