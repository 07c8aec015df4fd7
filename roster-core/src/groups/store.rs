//! Group Store
//!
//! Authoritative membership state for multi-recipient conversations.
//!
//! Every operation reads the group record fresh from storage, works on an
//! in-memory copy and writes the whole record back. Nothing is cached
//! between calls.
//!
//! # Absent groups
//!
//! `get_members`, `get_group`, `add_members` and `remove_member` return
//! `Ok(None)` for an unknown group so callers can retry idempotently.
//! `update_members` and `needs_update` need existing state to compute a
//! delta and fail with [`GroupError::UnknownGroup`] instead.

use crate::config::GroupsConfig;
use crate::groups::errors::{GroupError, GroupResult};
use crate::groups::id_generator::IdGenerator;
use crate::groups::locks::GroupLocks;
use crate::groups::registration::DeviceRegistrations;
use crate::groups::traits::{E164Validator, GroupStorage, MemberValidator, OsRandom, RandomSource};
use crate::groups::types::{DeviceKey, Group, GroupId, GroupRecord, MemberId, RegistrationId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

/// Group membership store
pub struct GroupStore {
    storage: Arc<dyn GroupStorage>,
    validator: Arc<dyn MemberValidator>,
    random: Arc<dyn RandomSource>,
    config: GroupsConfig,
    locks: GroupLocks,
}

impl GroupStore {
    /// Create a store over `storage` with default collaborators
    pub fn new(storage: Arc<dyn GroupStorage>) -> Self {
        Self {
            storage,
            validator: Arc::new(E164Validator),
            random: Arc::new(OsRandom),
            config: GroupsConfig::default(),
            locks: GroupLocks::new(),
        }
    }

    pub fn with_config(mut self, config: GroupsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn MemberValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn config(&self) -> &GroupsConfig {
        &self.config
    }

    /// Create a group.
    ///
    /// Members are validated, deduplicated in first-seen order, and
    /// `self_id` is appended if missing. With `explicit_id` the group is
    /// created under that id unless one already exists there.
    pub async fn create_group(
        &self,
        members: &[MemberId],
        explicit_id: Option<GroupId>,
        self_id: &MemberId,
    ) -> GroupResult<Group> {
        let (id, _guard) = match explicit_id {
            Some(id) => {
                let guard = self.guard(&id).await?;
                if self.storage.get_group(&id).await?.is_some() {
                    return Err(GroupError::DuplicateGroup(id));
                }
                (id, guard)
            }
            None => self.claim_generated_id().await?,
        };
        debug!(group_id = %id, count = members.len(), "creating group");

        self.validate(members)?;

        let mut seen = HashSet::with_capacity(members.len() + 1);
        let mut final_members: Vec<MemberId> = members
            .iter()
            .filter(|m| seen.insert(*m))
            .cloned()
            .collect();
        if !seen.contains(self_id) {
            final_members.push(self_id.clone());
        }

        let record = GroupRecord::new(final_members);
        self.storage.put_group(&id, &record).await?;

        info!(group_id = %id, members = record.members().len(), "group created");
        metrics::counter!(crate::metrics::GROUPS_CREATED).increment(1);

        Ok(Group { id, members: record.members().to_vec() })
    }

    /// Members of a group, `None` if the group does not exist
    pub async fn get_members(&self, id: &GroupId) -> GroupResult<Option<Vec<MemberId>>> {
        debug!(group_id = %id, "reading members");
        Ok(self
            .storage
            .get_group(id)
            .await?
            .map(|record| record.members().to_vec()))
    }

    /// Group view, `None` if the group does not exist
    pub async fn get_group(&self, id: &GroupId) -> GroupResult<Option<Group>> {
        debug!(group_id = %id, "reading group");
        Ok(self.storage.get_group(id).await?.map(|record| Group {
            id: id.clone(),
            members: record.members().to_vec(),
        }))
    }

    /// Remove `member` and all of its device registrations.
    ///
    /// Removing a non-member is a no-op returning the current list.
    /// Removing `self_id` is rejected: leaving goes through its own flow.
    pub async fn remove_member(
        &self,
        id: &GroupId,
        member: &MemberId,
        self_id: &MemberId,
    ) -> GroupResult<Option<Vec<MemberId>>> {
        let _guard = self.guard(id).await?;
        debug!(group_id = %id, member = %member, "removing member");

        let Some(mut record) = self.storage.get_group(id).await? else {
            return Ok(None);
        };

        if member == self_id {
            return Err(GroupError::CannotRemoveSelf(member.clone()));
        }

        if record.remove_member(member) {
            self.storage.put_group(id, &record).await?;
            metrics::counter!(crate::metrics::MEMBERS_REMOVED).increment(1);
        }

        Ok(Some(record.members().to_vec()))
    }

    /// Add every member not already present, in order.
    ///
    /// Any invalid identifier aborts the call before anything is written.
    pub async fn add_members(
        &self,
        id: &GroupId,
        members: &[MemberId],
    ) -> GroupResult<Option<Vec<MemberId>>> {
        let _guard = self.guard(id).await?;
        self.add_members_unguarded(id, members).await
    }

    async fn add_members_unguarded(
        &self,
        id: &GroupId,
        members: &[MemberId],
    ) -> GroupResult<Option<Vec<MemberId>>> {
        debug!(group_id = %id, count = members.len(), "adding members");

        let Some(mut record) = self.storage.get_group(id).await? else {
            return Ok(None);
        };

        self.validate(members)?;

        let added = members
            .iter()
            .filter(|m| record.add_member((*m).clone()))
            .count();

        if added > 0 {
            self.storage.put_group(id, &record).await?;
            metrics::counter!(crate::metrics::MEMBERS_ADDED).increment(added as u64);
        }

        Ok(Some(record.members().to_vec()))
    }

    /// Grow the group to `desired`, returning the newly added members.
    ///
    /// Fails if `desired` omits any current member: updates may only add.
    pub async fn update_members(
        &self,
        id: &GroupId,
        desired: &[MemberId],
    ) -> GroupResult<Vec<MemberId>> {
        let _guard = self.guard(id).await?;
        debug!(group_id = %id, count = desired.len(), "updating members");

        let record = self
            .storage
            .get_group(id)
            .await?
            .ok_or_else(|| GroupError::UnknownGroup(id.clone()))?;

        self.validate(desired)?;

        let wanted: HashSet<&MemberId> = desired.iter().collect();
        let missing: Vec<MemberId> = record
            .members()
            .iter()
            .filter(|m| !wanted.contains(m))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(GroupError::IllegalRemovalViaUpdate(missing));
        }

        let mut seen: HashSet<&MemberId> = record.members().iter().collect();
        let added: Vec<MemberId> = desired
            .iter()
            .filter(|m| seen.insert(*m))
            .cloned()
            .collect();

        let members = self
            .add_members_unguarded(id, &added)
            .await?
            .ok_or_else(|| GroupError::UnknownGroup(id.clone()))?;

        let resulting: HashSet<&MemberId> = members.iter().collect();
        if resulting.symmetric_difference(&wanted).next().is_some() {
            return Err(GroupError::InternalConsistency(format!(
                "membership of {} does not match requested update",
                id
            )));
        }

        Ok(added)
    }

    /// Record the registration id seen for `device` of `member`.
    ///
    /// Returns true only when a previously recorded id changed, meaning
    /// sessions with that device must be rebuilt. The first sighting of a
    /// device is stored and returns false; an unchanged id writes nothing.
    pub async fn needs_update(
        &self,
        id: &GroupId,
        member: &MemberId,
        device: &DeviceKey,
        registration_id: RegistrationId,
    ) -> GroupResult<bool> {
        let _guard = self.guard(id).await?;
        debug!(group_id = %id, member = %member, device = %device, "checking registration");

        let mut record = self
            .storage
            .get_group(id)
            .await?
            .ok_or_else(|| GroupError::UnknownGroup(id.clone()))?;

        let observation = record
            .registrations_mut()
            .observe(member, device, registration_id)
            .ok_or_else(|| GroupError::UnknownMember {
                group: id.clone(),
                member: member.clone(),
            })?;

        if observation.is_modified() {
            self.storage.put_group(id, &record).await?;
        }

        if observation.needs_update() {
            warn!(
                group_id = %id,
                member = %member,
                device = %device,
                registration_id = %registration_id,
                "device registration id changed"
            );
            metrics::counter!(crate::metrics::REGISTRATION_CHANGED).increment(1);
        }

        Ok(observation.needs_update())
    }

    /// Recorded device registrations for a member, `None` if the group or
    /// member is unknown
    pub async fn registration_ids(
        &self,
        id: &GroupId,
        member: &MemberId,
    ) -> GroupResult<Option<DeviceRegistrations>> {
        debug!(group_id = %id, member = %member, "reading registrations");
        Ok(self
            .storage
            .get_group(id)
            .await?
            .and_then(|record| record.registrations().devices(member).cloned()))
    }

    /// Delete a group. Deleting an unknown group is not an error.
    pub async fn delete_group(&self, id: &GroupId) -> GroupResult<()> {
        let _guard = self.guard(id).await?;
        debug!(group_id = %id, "deleting group");
        self.storage.remove_group(id).await?;
        info!(group_id = %id, "group deleted");
        metrics::counter!(crate::metrics::GROUPS_DELETED).increment(1);
        Ok(())
    }

    /// All stored group ids
    pub async fn list_groups(&self) -> GroupResult<Vec<GroupId>> {
        debug!("listing groups");
        self.storage.list_groups().await
    }

    /// Generate an unused id and take its guard.
    ///
    /// The probe runs before the guard is held, so the id is checked again
    /// under the guard and regenerated if another caller claimed it.
    async fn claim_generated_id(&self) -> GroupResult<(GroupId, Option<OwnedMutexGuard<()>>)> {
        let generator =
            IdGenerator::new(self.storage.as_ref(), self.random.as_ref(), self.config.max_id_attempts);
        for _ in 0..self.config.max_id_attempts {
            let id = generator.generate().await?;
            let guard = self.guard(&id).await?;
            if self.storage.get_group(&id).await?.is_none() {
                return Ok((id, guard));
            }
            warn!(group_id = %id, "generated group id claimed concurrently");
        }
        Err(GroupError::IdGenerationExhausted { attempts: self.config.max_id_attempts })
    }

    async fn guard(&self, id: &GroupId) -> GroupResult<Option<OwnedMutexGuard<()>>> {
        if !self.config.serialize_mutations {
            return Ok(None);
        }
        Ok(Some(self.locks.acquire(id).await?))
    }

    fn validate(&self, members: &[MemberId]) -> GroupResult<()> {
        match members.iter().find(|m| !self.validator.is_valid(m.as_str())) {
            Some(invalid) => Err(GroupError::InvalidMember(invalid.to_string())),
            None => Ok(()),
        }
    }
}
