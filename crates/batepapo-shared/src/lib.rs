//! # batepapo-shared
//!
//! Domain types shared by the store and the server: participants, chat
//! messages, validation rules and the per-participant visibility filter.
//! Nothing in this crate performs I/O.

pub mod clock;
pub mod constants;
pub mod error;
pub mod types;
pub mod visibility;

pub use error::ValidationError;
pub use types::{Message, MessageType, Participant};
