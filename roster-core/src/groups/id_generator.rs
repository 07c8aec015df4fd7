//! Group identifier generation
//!
//! Draws 128-bit random ids and probes storage until it finds one that is
//! not taken. A collision is logged and retried; running out of attempts is
//! an internal error.

use crate::groups::errors::{GroupError, GroupResult};
use crate::groups::traits::{GroupStorage, RandomSource};
use crate::groups::types::{GroupId, GROUP_ID_LEN};
use tracing::warn;

/// Default number of candidates drawn before giving up
pub const DEFAULT_MAX_ATTEMPTS: usize = 16;

/// Collision-free group id generator
pub struct IdGenerator<'a> {
    storage: &'a dyn GroupStorage,
    random: &'a dyn RandomSource,
    max_attempts: usize,
}

impl<'a> IdGenerator<'a> {
    pub fn new(storage: &'a dyn GroupStorage, random: &'a dyn RandomSource, max_attempts: usize) -> Self {
        Self { storage, random, max_attempts }
    }

    /// Draw a single candidate id without probing storage
    pub fn candidate(&self) -> GroupId {
        let mut bytes = [0u8; GROUP_ID_LEN];
        self.random.fill_bytes(&mut bytes);
        GroupId::from_bytes(&bytes)
    }

    /// Generate an id with no existing group in storage
    pub async fn generate(&self) -> GroupResult<GroupId> {
        for attempt in 1..=self.max_attempts {
            let id = self.candidate();
            if self.storage.get_group(&id).await?.is_none() {
                return Ok(id);
            }
            warn!(group_id = %id, attempt, "group id collision");
            metrics::counter!(crate::metrics::ID_COLLISIONS).increment(1);
        }
        Err(GroupError::IdGenerationExhausted { attempts: self.max_attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::storage::MemoryGroupStorage;
    use crate::groups::types::GroupRecord;
    use crate::test_utils::{CollidingStorage, SeededRandom};

    #[tokio::test]
    async fn test_generate_returns_unused_hex_id() {
        let storage = MemoryGroupStorage::new();
        let random = SeededRandom::new(1);
        let id = IdGenerator::new(&storage, &random, DEFAULT_MAX_ATTEMPTS)
            .generate()
            .await
            .unwrap();

        assert_eq!(id.as_str().len(), GROUP_ID_LEN * 2);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_generate_skips_existing_ids() {
        let storage = MemoryGroupStorage::new();

        // Occupy the first three candidates the seeded source will produce
        let preview = SeededRandom::new(7);
        let taken: Vec<GroupId> = {
            let generator = IdGenerator::new(&storage, &preview, DEFAULT_MAX_ATTEMPTS);
            (0..3).map(|_| generator.candidate()).collect()
        };
        for id in &taken {
            storage.put_group(id, &GroupRecord::default()).await.unwrap();
        }

        let random = SeededRandom::new(7);
        let id = IdGenerator::new(&storage, &random, DEFAULT_MAX_ATTEMPTS)
            .generate()
            .await
            .unwrap();

        assert!(!taken.contains(&id));
        assert!(storage.get_group(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_generate_survives_k_collisions() {
        for k in 0..10 {
            let storage = CollidingStorage::new(MemoryGroupStorage::new(), k);
            let random = SeededRandom::new(k as u64);
            let id = IdGenerator::new(&storage, &random, DEFAULT_MAX_ATTEMPTS)
                .generate()
                .await
                .unwrap();

            assert_eq!(storage.probes(), k + 1);
            assert!(storage.get_group(&id).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_generate_exhaustion_is_internal_error() {
        let storage = CollidingStorage::new(MemoryGroupStorage::new(), usize::MAX);
        let random = SeededRandom::new(3);
        let result = IdGenerator::new(&storage, &random, 4).generate().await;

        assert!(matches!(result, Err(GroupError::IdGenerationExhausted { attempts: 4 })));
        assert_eq!(storage.probes(), 4);
    }
}
