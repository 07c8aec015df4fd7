//! Collaborator boundaries of the group store
//!
//! The store owns membership logic only. Persistence, identifier syntax and
//! randomness are injected through these traits so that tests can swap in
//! in-memory or scripted implementations.

pub mod random;
pub mod storage;
pub mod validator;

pub use random::{OsRandom, RandomSource};
pub use storage::GroupStorage;
pub use validator::{E164Validator, MemberValidator};
