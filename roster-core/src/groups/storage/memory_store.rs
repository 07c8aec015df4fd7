//! In-Memory Group Storage
//!
//! Non-persistent backend for tests and ephemeral stores.

use crate::groups::errors::GroupResult;
use crate::groups::traits::storage::GroupStorage;
use crate::groups::types::{GroupId, GroupRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory group storage
#[derive(Clone, Default)]
pub struct MemoryGroupStorage {
    groups: Arc<RwLock<HashMap<GroupId, GroupRecord>>>,
}

impl MemoryGroupStorage {
    /// Create an empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored groups
    pub async fn len(&self) -> usize {
        self.groups.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.groups.read().await.is_empty()
    }
}

#[async_trait]
impl GroupStorage for MemoryGroupStorage {
    async fn get_group(&self, id: &GroupId) -> GroupResult<Option<GroupRecord>> {
        let groups = self.groups.read().await;
        Ok(groups.get(id).cloned())
    }

    async fn put_group(&self, id: &GroupId, record: &GroupRecord) -> GroupResult<()> {
        let mut groups = self.groups.write().await;
        groups.insert(id.clone(), record.clone());
        Ok(())
    }

    async fn remove_group(&self, id: &GroupId) -> GroupResult<()> {
        let mut groups = self.groups.write().await;
        groups.remove(id);
        Ok(())
    }

    async fn list_groups(&self) -> GroupResult<Vec<GroupId>> {
        let groups = self.groups.read().await;
        let mut ids: Vec<GroupId> = groups.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::types::MemberId;

    #[tokio::test]
    async fn test_memory_storage_roundtrip() {
        let storage = MemoryGroupStorage::new();
        let id = GroupId::from("g1");
        let record = GroupRecord::new(vec![MemberId::from("+1"), MemberId::from("+2")]);

        storage.put_group(&id, &record).await.unwrap();
        let loaded = storage.get_group(&id).await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_memory_storage_absent_and_remove() {
        let storage = MemoryGroupStorage::new();
        let id = GroupId::from("g1");

        assert!(storage.get_group(&id).await.unwrap().is_none());
        storage.remove_group(&id).await.unwrap();

        storage.put_group(&id, &GroupRecord::default()).await.unwrap();
        assert_eq!(storage.len().await, 1);
        storage.remove_group(&id).await.unwrap();
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_list_groups() {
        let storage = MemoryGroupStorage::new();
        storage.put_group(&GroupId::from("b"), &GroupRecord::default()).await.unwrap();
        storage.put_group(&GroupId::from("a"), &GroupRecord::default()).await.unwrap();

        let ids = storage.list_groups().await.unwrap();
        assert_eq!(ids, vec![GroupId::from("a"), GroupId::from("b")]);
    }
}
