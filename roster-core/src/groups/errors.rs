//! Error types for group membership operations

use crate::groups::types::{GroupId, MemberId};
use thiserror::Error;

/// Result type for group store operations
pub type GroupResult<T> = Result<T, GroupError>;

/// Errors that can occur in group store operations
#[derive(Debug, Error)]
pub enum GroupError {
    /// A group already exists under the requested explicit id
    #[error("Group already exists: {0}")]
    DuplicateGroup(GroupId),

    /// A member identifier failed validation
    #[error("Invalid member identifier: {0}")]
    InvalidMember(String),

    /// Operation requires an existing group
    #[error("Unknown group: {0}")]
    UnknownGroup(GroupId),

    /// Member has no registration entry in the group
    #[error("Unknown member {member} in group {group}")]
    UnknownMember { group: GroupId, member: MemberId },

    /// Removing the local user must go through the leave flow
    #[error("Cannot remove self ({0}) from a group, leave the group instead")]
    CannotRemoveSelf(MemberId),

    /// An update omitted existing members
    #[error("Update would remove members from group: {0:?}")]
    IllegalRemovalViaUpdate(Vec<MemberId>),

    /// Post-condition of a membership computation did not hold
    #[error("Internal consistency violation: {0}")]
    InternalConsistency(String),

    /// Identifier generation kept colliding with existing groups
    #[error("Failed to generate a unique group id after {attempts} attempts")]
    IdGenerationExhausted { attempts: usize },

    /// Persistence backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Record (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (bug)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for GroupError {
    fn from(e: serde_json::Error) -> Self {
        GroupError::Serialization(e.to_string())
    }
}
