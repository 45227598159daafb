//! Presence sweeper.
//!
//! Runs on a fixed interval, evicts participants whose last heartbeat is
//! older than the staleness threshold and broadcasts a leave notice for each
//! of them. A failed cycle is logged and skipped; the loop keeps going.
//!
//! A heartbeat that races with the sweep that evicts its participant is
//! lost: the participant is gone and has to register again.

use std::time::Duration;

use batepapo_shared::{clock, Participant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::error::ServerError;
use crate::store::ChatStore;

pub struct PresenceSweeper {
    store: ChatStore,
    interval: Duration,
    stale_after: Duration,
}

impl PresenceSweeper {
    pub fn new(store: ChatStore, interval: Duration, stale_after: Duration) -> Self {
        Self {
            store,
            interval,
            stale_after,
        }
    }

    /// Spawn the sweep loop on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                match self.sweep_once(clock::now_millis(), clock::local_time()).await {
                    Ok(evicted) if !evicted.is_empty() => {
                        info!(count = evicted.len(), "Evicted idle participants");
                    }
                    Ok(_) => debug!("Sweep found no idle participants"),
                    Err(e) => error!(op = "sweep", error = %e, "Presence sweep failed"),
                }
            }
        })
    }

    /// Run one sweep as of `now_ms`, stamping leave notices with `time`.
    ///
    /// Evictions and their leave notices are committed together. A failed
    /// sweep commits neither, and one that timed out before reaching the
    /// store never runs, leaving its work to the next tick.
    /// Returns the evicted participants.
    pub async fn sweep_once(
        &self,
        now_ms: i64,
        time: String,
    ) -> Result<Vec<Participant>, ServerError> {
        let stale_after = i64::try_from(self.stale_after.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now_ms.saturating_sub(stale_after);

        let evicted = self
            .store
            .run("evict_stale", move |db| db.evict_stale_participants(cutoff, &time))
            .await?;

        for participant in &evicted {
            info!(name = %participant.name, "Participant left (idle)");
        }

        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use batepapo_shared::constants::{BROADCAST, LEAVE_TEXT};
    use batepapo_shared::{Message, MessageType};
    use batepapo_store::Database;

    fn sweeper(store: &ChatStore) -> PresenceSweeper {
        PresenceSweeper::new(
            store.clone(),
            Duration::from_secs(15),
            Duration::from_secs(10),
        )
    }

    fn store_with_timeout(op_timeout: Duration) -> ChatStore {
        ChatStore::new(Database::open_in_memory().unwrap(), op_timeout)
    }

    /// Keep the database busy for `busy`, returning once `run` has given up
    /// waiting on it.
    async fn occupy(store: &ChatStore, busy: Duration) {
        let _ = store
            .run("occupy", move |_db| {
                std::thread::sleep(busy);
                Ok(())
            })
            .await;
    }

    async fn setup() -> ChatStore {
        let store = store_with_timeout(Duration::from_secs(5));
        registry::register(&store, "Ana", 0, "10:00:00".into())
            .await
            .unwrap();
        registry::register(&store, "Bia", 0, "10:00:00".into())
            .await
            .unwrap();
        store
    }

    async fn leave_notices(store: &ChatStore) -> Vec<Message> {
        store
            .run("test", |db| db.list_messages())
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.text == LEAVE_TEXT)
            .collect()
    }

    #[tokio::test]
    async fn test_sweep_evicts_stale_and_announces() {
        let store = setup().await;
        registry::heartbeat(&store, "Bia", 15_000).await.unwrap();

        let evicted = sweeper(&store)
            .sweep_once(20_000, "10:00:20".into())
            .await
            .unwrap();
        assert_eq!(evicted, vec![Participant::new("Ana", 0)]);

        let remaining = registry::list(&store).await.unwrap();
        assert_eq!(remaining, vec![Participant::new("Bia", 15_000)]);

        let notices = leave_notices(&store).await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].from, "Ana");
        assert_eq!(notices[0].to, BROADCAST);
        assert_eq!(notices[0].kind, MessageType::Status);
        assert_eq!(notices[0].time, "10:00:20");
    }

    #[tokio::test]
    async fn test_sweep_keeps_participants_within_threshold() {
        let store = setup().await;
        // Exactly at the threshold is still fresh.
        let evicted = sweeper(&store)
            .sweep_once(10_000, "10:00:10".into())
            .await
            .unwrap();
        assert!(evicted.is_empty());
        assert_eq!(registry::list(&store).await.unwrap().len(), 2);
        assert!(leave_notices(&store).await.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_sweeps_announce_once() {
        let store = setup().await;
        let sweeper = sweeper(&store);
        sweeper.sweep_once(60_000, "10:01:00".into()).await.unwrap();
        let again = sweeper.sweep_once(60_000, "10:01:00".into()).await.unwrap();
        assert!(again.is_empty());
        assert_eq!(leave_notices(&store).await.len(), 2);
    }

    #[tokio::test]
    async fn test_evicted_name_can_register_again() {
        let store = setup().await;
        sweeper(&store)
            .sweep_once(60_000, "10:01:00".into())
            .await
            .unwrap();
        registry::register(&store, "Ana", 60_001, "10:01:00".into())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_timed_out_sweep_evicts_nothing() {
        let store = store_with_timeout(Duration::from_millis(100));
        registry::register(&store, "Ana", 0, "10:00:00".into())
            .await
            .unwrap();
        let sweeper = sweeper(&store);

        occupy(&store, Duration::from_millis(300)).await;
        let err = sweeper
            .sweep_once(60_000, "10:01:00".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::StoreUnavailable(_)));

        // Let the abandoned sweep reach the database.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(registry::list(&store).await.unwrap().len(), 1);
        assert!(leave_notices(&store).await.is_empty());

        let evicted = sweeper.sweep_once(60_000, "10:01:00".into()).await.unwrap();
        assert_eq!(evicted, vec![Participant::new("Ana", 0)]);
        let notices = leave_notices(&store).await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].from, "Ana");
    }

    #[tokio::test]
    async fn test_huge_threshold_does_not_overflow() {
        let store = setup().await;
        let sweeper = PresenceSweeper::new(
            store.clone(),
            Duration::from_secs(15),
            Duration::from_secs(u64::MAX),
        );
        let evicted = sweeper.sweep_once(i64::MIN + 1, "10:00:00".into()).await.unwrap();
        assert!(evicted.is_empty());
        assert_eq!(registry::list(&store).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_spawned_loop_survives_and_sweeps() {
        let store = store_with_timeout(Duration::from_secs(5));
        // A participant whose heartbeat is far in the past.
        registry::register(&store, "Ana", 0, "10:00:00".into())
            .await
            .unwrap();

        let handle = PresenceSweeper::new(
            store.clone(),
            Duration::from_millis(20),
            Duration::from_secs(10),
        )
        .spawn();

        for _ in 0..50 {
            if registry::list(&store).await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(registry::list(&store).await.unwrap().is_empty());
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn test_spawned_loop_recovers_after_failed_cycle() {
        let store = store_with_timeout(Duration::from_millis(50));
        registry::register(&store, "Ana", 0, "10:00:00".into())
            .await
            .unwrap();

        // Busy for 250ms: the first ticks time out before the store frees up.
        occupy(&store, Duration::from_millis(250)).await;
        let handle = PresenceSweeper::new(
            store.clone(),
            Duration::from_millis(20),
            Duration::from_secs(10),
        )
        .spawn();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_finished());

        let mut gone = false;
        for _ in 0..100 {
            if let Ok(list) = registry::list(&store).await {
                if list.is_empty() {
                    gone = true;
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(gone, "a later tick should evict the idle participant");
        assert!(!handle.is_finished());
        handle.abort();

        let notices = leave_notices(&store).await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].from, "Ana");
    }
}
