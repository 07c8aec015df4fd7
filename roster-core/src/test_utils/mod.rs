//! Test utilities and helpers for Roster
//!
//! Deterministic collaborators, storage doubles and assertion helpers shared
//! by unit and integration tests.

pub mod assertions;
pub mod deterministic_rng;
pub mod fixtures;
pub mod storage_doubles;

pub use assertions::*;
pub use deterministic_rng::*;
pub use fixtures::*;
pub use storage_doubles::*;
