//! Roster: group membership store for multi-device encrypted messaging
//!
//! Keeps the authoritative member list of every group and, per member
//! device, the last observed registration id, so the messaging layer can
//! tell when cached session state has gone stale.

pub mod config;
pub mod groups;
pub mod logging;
pub mod metrics;
pub mod test_utils;

pub use config::Config;
pub use groups::{
    DeviceKey, Group, GroupError, GroupId, GroupResult, GroupStore, MemberId, RegistrationId,
};
pub use logging::{init_logging, LogLevel};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = LogLevel::Info;
        let _ = Config::default();
        let _ = GroupId::from("exported");
    }
}
