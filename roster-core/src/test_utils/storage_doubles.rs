//! Storage wrappers for observing and perturbing store behaviour

use crate::groups::errors::GroupResult;
use crate::groups::traits::GroupStorage;
use crate::groups::types::{GroupId, GroupRecord};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Reports the first `collisions` lookups as existing groups
///
/// Used to force the id generator through repeated collisions.
pub struct CollidingStorage<S> {
    inner: S,
    collisions: usize,
    probes: AtomicUsize,
}

impl<S: GroupStorage> CollidingStorage<S> {
    pub fn new(inner: S, collisions: usize) -> Self {
        Self { inner, collisions, probes: AtomicUsize::new(0) }
    }

    /// Number of `get_group` calls served so far
    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: GroupStorage> GroupStorage for CollidingStorage<S> {
    async fn get_group(&self, id: &GroupId) -> GroupResult<Option<GroupRecord>> {
        let probe = self.probes.fetch_add(1, Ordering::SeqCst);
        if probe < self.collisions {
            return Ok(Some(GroupRecord::default()));
        }
        self.inner.get_group(id).await
    }

    async fn put_group(&self, id: &GroupId, record: &GroupRecord) -> GroupResult<()> {
        self.inner.put_group(id, record).await
    }

    async fn remove_group(&self, id: &GroupId) -> GroupResult<()> {
        self.inner.remove_group(id).await
    }

    async fn list_groups(&self) -> GroupResult<Vec<GroupId>> {
        self.inner.list_groups().await
    }
}

/// Counts reads and writes passing through to `inner`
#[derive(Clone)]
pub struct CountingStorage<S> {
    inner: S,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl<S: GroupStorage> CountingStorage<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reads: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: GroupStorage> GroupStorage for CountingStorage<S> {
    async fn get_group(&self, id: &GroupId) -> GroupResult<Option<GroupRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_group(id).await
    }

    async fn put_group(&self, id: &GroupId, record: &GroupRecord) -> GroupResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put_group(id, record).await
    }

    async fn remove_group(&self, id: &GroupId) -> GroupResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_group(id).await
    }

    async fn list_groups(&self) -> GroupResult<Vec<GroupId>> {
        self.inner.list_groups().await
    }
}

/// Holds every successful read for `delay` before handing it back
///
/// Widens the gap between a read and the write that follows it so
/// interleaved read-modify-write cycles actually overlap.
pub struct SlowReadStorage<S> {
    inner: S,
    delay: Duration,
}

impl<S: GroupStorage> SlowReadStorage<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<S: GroupStorage> GroupStorage for SlowReadStorage<S> {
    async fn get_group(&self, id: &GroupId) -> GroupResult<Option<GroupRecord>> {
        let record = self.inner.get_group(id).await?;
        tokio::time::sleep(self.delay).await;
        Ok(record)
    }

    async fn put_group(&self, id: &GroupId, record: &GroupRecord) -> GroupResult<()> {
        self.inner.put_group(id, record).await
    }

    async fn remove_group(&self, id: &GroupId) -> GroupResult<()> {
        self.inner.remove_group(id).await
    }

    async fn list_groups(&self) -> GroupResult<Vec<GroupId>> {
        self.inner.list_groups().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::storage::MemoryGroupStorage;

    #[tokio::test]
    async fn test_colliding_storage_reports_then_delegates() {
        let storage = CollidingStorage::new(MemoryGroupStorage::new(), 2);
        let id = GroupId::from("x");

        assert!(storage.get_group(&id).await.unwrap().is_some());
        assert!(storage.get_group(&id).await.unwrap().is_some());
        assert!(storage.get_group(&id).await.unwrap().is_none());
        assert_eq!(storage.probes(), 3);
    }

    #[tokio::test]
    async fn test_counting_storage_counts() {
        let storage = CountingStorage::new(MemoryGroupStorage::new());
        let id = GroupId::from("x");

        storage.put_group(&id, &GroupRecord::default()).await.unwrap();
        storage.get_group(&id).await.unwrap();
        storage.remove_group(&id).await.unwrap();

        assert_eq!(storage.reads(), 1);
        assert_eq!(storage.writes(), 2);
    }

    #[tokio::test]
    async fn test_slow_read_storage_delays_reads() {
        let storage = SlowReadStorage::new(MemoryGroupStorage::new(), Duration::from_millis(20));
        let id = GroupId::from("x");
        storage.put_group(&id, &GroupRecord::default()).await.unwrap();

        let started = std::time::Instant::now();
        assert!(storage.get_group(&id).await.unwrap().is_some());
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
