//! Group Storage Trait
//!
//! Whole-record key-value persistence for group records.

use crate::groups::errors::GroupResult;
use crate::groups::types::{GroupId, GroupRecord};
use async_trait::async_trait;

/// Storage backend for group records
///
/// Implementations provide plain get/put/delete by key. No compare-and-swap
/// is assumed; the store serializes its own read-modify-write cycles.
#[async_trait]
pub trait GroupStorage: Send + Sync {
    /// Load the record stored under `id`, `None` if absent.
    async fn get_group(&self, id: &GroupId) -> GroupResult<Option<GroupRecord>>;

    /// Store `record` under `id`, replacing any existing record.
    async fn put_group(&self, id: &GroupId, record: &GroupRecord) -> GroupResult<()>;

    /// Delete the record under `id`. Deleting an absent id is not an error.
    async fn remove_group(&self, id: &GroupId) -> GroupResult<()>;

    /// List all stored group ids
    ///
    /// Optional: used for recovery and tooling.
    async fn list_groups(&self) -> GroupResult<Vec<GroupId>> {
        Ok(Vec::new())
    }
}
