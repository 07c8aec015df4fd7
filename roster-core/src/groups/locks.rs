//! Per-group mutation guards
//!
//! Storage offers no compare-and-swap, so two interleaved read-modify-write
//! cycles on the same group would lose an update. The store takes the guard
//! for a group id before reading and releases it after writing back.

use crate::groups::errors::{GroupError, GroupResult};
use crate::groups::types::GroupId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Table size above which idle entries are pruned
const PRUNE_THRESHOLD: usize = 1024;

fn handle_poison<T>(_err: PoisonError<T>) -> GroupError {
    GroupError::Internal("Lock table poisoned: a thread panicked while holding the lock".to_string())
}

/// Lock table keyed by group id, scoped to one store
#[derive(Default)]
pub struct GroupLocks {
    locks: Mutex<HashMap<GroupId, Arc<AsyncMutex<()>>>>,
}

impl GroupLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`
    pub async fn acquire(&self, id: &GroupId) -> GroupResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock().map_err(handle_poison)?;
            if locks.len() > PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks
                .entry(id.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        Ok(lock.lock_owned().await)
    }

    /// Number of ids currently in the table
    pub(crate) fn len(&self) -> GroupResult<usize> {
        Ok(self.locks.lock().map_err(handle_poison)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_id_is_exclusive() {
        let locks = Arc::new(GroupLocks::new());
        let id = GroupId::from("g");

        let guard = locks.acquire(&id).await.unwrap();

        let locks2 = locks.clone();
        let id2 = id.clone();
        let waiter = tokio::spawn(async move {
            let _guard = locks2.acquire(&id2).await.unwrap();
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_ids_do_not_block() {
        let locks = GroupLocks::new();
        let _a = locks.acquire(&GroupId::from("a")).await.unwrap();
        let _b = locks.acquire(&GroupId::from("b")).await.unwrap();
        assert_eq!(locks.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = GroupLocks::new();
        for i in 0..=PRUNE_THRESHOLD {
            drop(locks.acquire(&GroupId::from(format!("g{}", i))).await.unwrap());
        }
        assert_eq!(locks.len().unwrap(), PRUNE_THRESHOLD + 1);

        let _held = locks.acquire(&GroupId::from("fresh")).await.unwrap();
        assert_eq!(locks.len().unwrap(), 1);
    }
}
