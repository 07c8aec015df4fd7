//! Metrics for group store events
//!
//! Counters are emitted through the `metrics` facade; they are no-ops until
//! the host process installs a recorder.

use metrics::describe_counter;

/// Groups persisted by `create_group`
pub const GROUPS_CREATED: &str = "roster.groups.created";
/// Groups removed by `delete_group`
pub const GROUPS_DELETED: &str = "roster.groups.deleted";
/// Generated ids that were already taken
pub const ID_COLLISIONS: &str = "roster.groups.id_collisions";
/// Members appended by add or update
pub const MEMBERS_ADDED: &str = "roster.members.added";
/// Members removed
pub const MEMBERS_REMOVED: &str = "roster.members.removed";
/// Device registration ids that changed since last observed
pub const REGISTRATION_CHANGED: &str = "roster.registration.changed";

/// Register descriptions for every counter
pub fn init_metrics() {
    describe_counter!(GROUPS_CREATED, "Number of groups created");
    describe_counter!(GROUPS_DELETED, "Number of groups deleted");
    describe_counter!(ID_COLLISIONS, "Number of group id collisions during generation");
    describe_counter!(MEMBERS_ADDED, "Number of members added to groups");
    describe_counter!(MEMBERS_REMOVED, "Number of members removed from groups");
    describe_counter!(REGISTRATION_CHANGED, "Number of device registration id changes detected");
}
