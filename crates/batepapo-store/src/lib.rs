//! # batepapo-store
//!
//! Persistent storage for the chat room, backed by SQLite.
//!
//! Two collections are kept: `participants` (keyed by display name) and
//! `messages` (append-only, ordered by insertion). The crate exposes a
//! synchronous [`Database`] handle that wraps a `rusqlite::Connection` and
//! provides typed helpers for both.

pub mod database;
pub mod messages;
pub mod migrations;
pub mod participants;

mod error;

pub use batepapo_shared::{Message, MessageType, Participant};
pub use database::Database;
pub use error::{Result, StoreError};
