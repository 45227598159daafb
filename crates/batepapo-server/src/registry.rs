//! Participant registry: registration, heartbeats and listing.

use batepapo_shared::types::normalize_name;
use batepapo_shared::{Message, Participant};
use tracing::{debug, info};

use crate::error::ServerError;
use crate::store::ChatStore;

/// Register `raw_name` as an active participant and announce the join.
///
/// The participant row and the join notice are written in one transaction.
pub async fn register(
    store: &ChatStore,
    raw_name: &str,
    now_ms: i64,
    time: String,
) -> Result<Participant, ServerError> {
    let name = normalize_name(raw_name)?;
    let participant = Participant::new(name.clone(), now_ms);
    let notice = Message::join_notice(&name, time);

    let record = participant.clone();
    let created = store
        .run("register", move |db| {
            let tx = db.conn().unchecked_transaction()?;
            if !db.insert_participant_if_absent(&record)? {
                return Ok(false);
            }
            db.insert_message(&notice)?;
            tx.commit()?;
            Ok(true)
        })
        .await?;

    if !created {
        return Err(ServerError::Conflict(format!("name {name:?} is taken")));
    }

    info!(name = %participant.name, "Participant joined");
    Ok(participant)
}

/// Refresh the heartbeat of `name`.
pub async fn heartbeat(store: &ChatStore, name: &str, now_ms: i64) -> Result<(), ServerError> {
    let key = name.to_string();
    let found = store
        .run("heartbeat", move |db| db.touch_participant(&key, now_ms))
        .await?;

    if !found {
        return Err(ServerError::NotFound(format!("participant {name:?}")));
    }
    debug!(name, "Heartbeat");
    Ok(())
}

pub async fn list(store: &ChatStore) -> Result<Vec<Participant>, ServerError> {
    store
        .run("list_participants", |db| db.list_participants())
        .await
}
