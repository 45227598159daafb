//! Process-wide handle to the chat store.
//!
//! A single [`Database`] is opened at startup and shared by every request
//! handler and the presence sweeper. Each operation runs on the blocking
//! pool under a timeout; an expired timeout surfaces as
//! [`ServerError::StoreUnavailable`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use batepapo_store::Database;
use tracing::{info, warn};

use crate::error::ServerError;

#[derive(Clone)]
pub struct ChatStore {
    db: Arc<Mutex<Database>>,
    op_timeout: Duration,
}

impl ChatStore {
    pub fn new(db: Database, op_timeout: Duration) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            op_timeout,
        }
    }

    /// Run `f` against the database. `op` names the operation in errors.
    ///
    /// If the timeout expires while `f` is still waiting for the database,
    /// `f` is never run. An `f` that already started is not interrupted; it
    /// finishes in the background and its result is discarded.
    pub async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, ServerError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> batepapo_store::Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        let abandoned = Arc::new(AtomicBool::new(false));
        let caller_gone = abandoned.clone();
        let task = tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|_| ServerError::StoreUnavailable(format!("{op}: lock poisoned")))?;
            if caller_gone.load(Ordering::SeqCst) {
                return Err(ServerError::StoreUnavailable(format!(
                    "{op}: abandoned after timeout"
                )));
            }
            f(&guard).map_err(ServerError::from)
        });

        match tokio::time::timeout(self.op_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ServerError::StoreUnavailable(format!("{op}: {e}"))),
            Err(_) => {
                abandoned.store(true, Ordering::SeqCst);
                Err(ServerError::StoreUnavailable(format!(
                    "{op}: timed out after {:?}",
                    self.op_timeout
                )))
            }
        }
    }

    /// Close the underlying database. Only succeeds once every other clone
    /// of this handle has been dropped.
    pub fn close(self) {
        match Arc::try_unwrap(self.db) {
            Ok(mutex) => {
                let db = mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
                match db.close() {
                    Ok(()) => info!("Store closed"),
                    Err(e) => warn!(error = %e, "Failed to close store cleanly"),
                }
            }
            Err(_) => warn!("Store still in use at shutdown, dropping handle"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batepapo_store::Participant;

    fn store(timeout: Duration) -> ChatStore {
        ChatStore::new(Database::open_in_memory().unwrap(), timeout)
    }

    #[tokio::test]
    async fn test_run_returns_result() {
        let store = store(Duration::from_secs(5));
        let inserted = store
            .run("insert", |db| {
                db.insert_participant_if_absent(&Participant::new("Ana", 1))
            })
            .await
            .unwrap();
        assert!(inserted);

        let all = store.run("list", |db| db.list_participants()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_slow_operation_times_out() {
        let store = store(Duration::from_millis(20));
        let err = store
            .run("slow", |_db| {
                std::thread::sleep(Duration::from_millis(200));
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_timed_out_operation_waiting_for_lock_never_runs() {
        let store = store(Duration::from_millis(100));
        // Holds the database for 300ms, well past the timeout.
        let _ = store
            .run("hold", |_db| {
                std::thread::sleep(Duration::from_millis(300));
                Ok(())
            })
            .await;

        let err = store
            .run("insert", |db| {
                db.insert_participant_if_absent(&Participant::new("Ana", 1))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::StoreUnavailable(_)));

        tokio::time::sleep(Duration::from_millis(400)).await;
        let all = store.run("list", |db| db.list_participants()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_close_with_outstanding_clone_does_not_panic() {
        let store = store(Duration::from_secs(1));
        let other = store.clone();
        store.close();
        other.close();
    }
}
