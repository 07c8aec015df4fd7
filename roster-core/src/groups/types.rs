//! Group membership types
//!
//! Identifiers for groups, members and devices, plus the persisted group
//! record and the read-only view handed back to callers.

use crate::groups::registration::RegistrationIndex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length in bytes of a generated group id (128 bits)
pub const GROUP_ID_LEN: usize = 16;

/// Opaque group identifier
///
/// Generated ids are hex-encoded random bytes; ids supplied by callers are
/// kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Create a GroupId from raw random bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        GroupId(hex::encode(bytes))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for GroupId {
    fn from(s: String) -> Self {
        GroupId(s)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        GroupId(s.to_string())
    }
}

/// Recipient identifier of a group member (e.g. an E.164 phone number)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        MemberId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        MemberId(s)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        MemberId(s.to_string())
    }
}

/// Key distinguishing one of a member's devices
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceKey(String);

impl DeviceKey {
    pub fn new(key: impl Into<String>) -> Self {
        DeviceKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceKey {
    fn from(s: &str) -> Self {
        DeviceKey(s.to_string())
    }
}

/// Per-device registration identifier; changes when a device reinstalls
/// or rotates its session material
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(pub u32);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RegistrationId {
    fn from(v: u32) -> Self {
        RegistrationId(v)
    }
}

/// Persisted group record
///
/// Invariant: the keys of `registrations` are exactly the entries of
/// `members`. Only the mutators below touch both fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Members in first-seen order, no duplicates
    members: Vec<MemberId>,
    /// member -> (device -> last observed registration id)
    registrations: RegistrationIndex,
}

impl GroupRecord {
    /// Build a record from an already normalized member list
    pub fn new(members: Vec<MemberId>) -> Self {
        let mut registrations = RegistrationIndex::default();
        for member in &members {
            registrations.track(member.clone());
        }
        Self { members, registrations }
    }

    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    pub fn contains(&self, member: &MemberId) -> bool {
        self.members.contains(member)
    }

    /// Append a member with an empty registration mapping.
    ///
    /// Returns false and leaves the record untouched if already present.
    pub fn add_member(&mut self, member: MemberId) -> bool {
        if self.contains(&member) {
            return false;
        }
        self.registrations.track(member.clone());
        self.members.push(member);
        true
    }

    /// Remove a member together with all of its device registrations.
    pub fn remove_member(&mut self, member: &MemberId) -> bool {
        match self.members.iter().position(|m| m == member) {
            Some(index) => {
                self.members.remove(index);
                self.registrations.forget(member);
                true
            }
            None => false,
        }
    }

    pub fn registrations(&self) -> &RegistrationIndex {
        &self.registrations
    }

    pub fn registrations_mut(&mut self) -> &mut RegistrationIndex {
        &mut self.registrations
    }
}

/// Caller-facing view of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub members: Vec<MemberId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(s: &str) -> MemberId {
        MemberId::from(s)
    }

    #[test]
    fn test_group_id_from_bytes_is_hex() {
        let id = GroupId::from_bytes(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(id.as_str(), "deadbeef");
    }

    #[test]
    fn test_record_new_tracks_every_member() {
        let record = GroupRecord::new(vec![m("+1"), m("+2")]);
        assert!(record.registrations().is_tracked(&m("+1")));
        assert!(record.registrations().is_tracked(&m("+2")));
        assert_eq!(record.registrations().len(), 2);
    }

    #[test]
    fn test_add_member_appends_once() {
        let mut record = GroupRecord::new(vec![m("+1")]);
        assert!(record.add_member(m("+2")));
        assert!(!record.add_member(m("+2")));
        assert_eq!(record.members(), &[m("+1"), m("+2")]);
        assert_eq!(record.registrations().len(), 2);
    }

    #[test]
    fn test_remove_member_drops_registrations() {
        let mut record = GroupRecord::new(vec![m("+1"), m("+2"), m("+3")]);
        assert!(record.remove_member(&m("+2")));
        assert!(!record.remove_member(&m("+2")));
        assert_eq!(record.members(), &[m("+1"), m("+3")]);
        assert!(!record.registrations().is_tracked(&m("+2")));

        record.remove_member(&m("+1"));
        record.remove_member(&m("+3"));
        assert!(record.members().is_empty());
        assert!(record.registrations().is_empty());
    }

    #[test]
    fn test_record_json_shape() {
        let record = GroupRecord::new(vec![m("+1")]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["members"][0], "+1");
        assert!(json["registrations"]["+1"].as_object().unwrap().is_empty());
    }
}
