//! Registration tracking
//!
//! Records, per (member, device), the registration id last seen for that
//! device. The messaging layer asks after every delivery whether the id it
//! just saw differs from the recorded one: a change means the cached
//! session for that device is stale and has to be rebuilt, while the first
//! sighting of a device only needs to be remembered.
//!
//! A device key that is absent from a member's mapping has never been
//! observed. A present key holds the last observed value, which may be
//! stale. [`RegistrationIndex::observe`] depends on that distinction.

use crate::groups::types::{DeviceKey, MemberId, RegistrationId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registrations observed for one member, keyed by device
pub type DeviceRegistrations = BTreeMap<DeviceKey, RegistrationId>;

/// Outcome of observing a device's registration id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Matches the recorded value; nothing to store
    Unchanged,
    /// Device never seen before; value recorded, sessions are fine
    FirstSighting,
    /// Recorded value differed; value replaced, sessions must be rebuilt
    Changed { previous: RegistrationId },
}

impl Observation {
    /// Whether cached session state for the device must be invalidated
    pub fn needs_update(&self) -> bool {
        matches!(self, Observation::Changed { .. })
    }

    /// Whether the index was modified and the record must be persisted
    pub fn is_modified(&self) -> bool {
        !matches!(self, Observation::Unchanged)
    }
}

/// Two-level mapping: member -> (device -> registration id)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationIndex(BTreeMap<MemberId, DeviceRegistrations>);

impl RegistrationIndex {
    /// Start tracking a member with no observed devices.
    ///
    /// Any previously recorded devices for the member are discarded.
    pub fn track(&mut self, member: MemberId) {
        self.0.insert(member, DeviceRegistrations::new());
    }

    /// Stop tracking a member, dropping all of its devices
    pub fn forget(&mut self, member: &MemberId) {
        self.0.remove(member);
    }

    pub fn is_tracked(&self, member: &MemberId) -> bool {
        self.0.contains_key(member)
    }

    pub fn devices(&self, member: &MemberId) -> Option<&DeviceRegistrations> {
        self.0.get(member)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Record `registration_id` for `device` of `member`.
    ///
    /// Returns `None` when the member is not tracked.
    pub fn observe(
        &mut self,
        member: &MemberId,
        device: &DeviceKey,
        registration_id: RegistrationId,
    ) -> Option<Observation> {
        let devices = self.0.get_mut(member)?;
        let observation = match devices.get(device) {
            Some(previous) if *previous == registration_id => return Some(Observation::Unchanged),
            Some(previous) => Observation::Changed { previous: *previous },
            None => Observation::FirstSighting,
        };
        devices.insert(device.clone(), registration_id);
        Some(observation)
    }
}
