//! Test fixtures for building member lists and stores

use crate::groups::storage::MemoryGroupStorage;
use crate::groups::store::GroupStore;
use crate::groups::types::MemberId;
use crate::test_utils::SeededRandom;
use std::sync::Arc;

/// Build a member list from string literals
pub fn members(ids: &[&str]) -> Vec<MemberId> {
    ids.iter().map(|id| MemberId::from(*id)).collect()
}

/// Member id for the `n`th test user, a valid E.164 number
pub fn test_member(n: u32) -> MemberId {
    MemberId::new(format!("+1555{:07}", n))
}

/// Store over fresh in-memory storage with a seeded random source
pub fn memory_store(seed: u64) -> (GroupStore, MemoryGroupStorage) {
    let storage = MemoryGroupStorage::new();
    let store = GroupStore::new(Arc::new(storage.clone())).with_random(Arc::new(SeededRandom::new(seed)));
    (store, storage)
}
