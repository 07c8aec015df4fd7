//! Group membership
//!
//! Tracks which recipients belong to each multi-recipient conversation and,
//! per member device, the registration id last observed.
//!
//! ## Components
//!
//! - [`IdGenerator`]: collision-free random group ids
//! - [`GroupStore`]: create/read/add/remove/update/delete with membership
//!   invariants
//! - [`RegistrationIndex`]: per-device registration change detection
//! - [`GroupLocks`]: per-group serialization of read-modify-write cycles
//!
//! Persistence, identifier validation and randomness are injected through
//! the traits in [`traits`].

pub mod errors;
pub mod id_generator;
pub mod locks;
pub mod registration;
pub mod storage;
pub mod store;
pub mod traits;
pub mod types;

pub use errors::{GroupError, GroupResult};
pub use id_generator::IdGenerator;
pub use locks::GroupLocks;
pub use registration::{DeviceRegistrations, Observation, RegistrationIndex};
pub use storage::{MemoryGroupStorage, SqlGroupStorage};
pub use store::GroupStore;
pub use traits::{E164Validator, GroupStorage, MemberValidator, OsRandom, RandomSource};
pub use types::{DeviceKey, Group, GroupId, GroupRecord, MemberId, RegistrationId, GROUP_ID_LEN};
