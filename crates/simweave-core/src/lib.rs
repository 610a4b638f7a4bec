//! Simweave Core - identity and permission foundation
//!
//! This crate provides the leaf types of the Simweave component model:
//!
//! - [`Identifier`] and the per-project [`IdGenerator`] that issues, reserves
//!   and releases identifiers
//! - [`SimUserRole`], [`AccessPrivilege`] and the per-component
//!   [`AccessProfile`] with its derived [`ProfileState`]
//! - the unified [`SimError`] type
//! - [`ProjectConfig`] and the [`Clock`] abstraction used for audit stamps
//!
//! Ownership, collections and notifications live in `simweave-components`.

#![forbid(unsafe_code)]

/// Roles, privileges and access profiles
pub mod access;

/// Project configuration
pub mod config;

/// Unified error handling
pub mod errors;

/// Identity allocation
pub mod id_generator;

/// Identifier types
pub mod identifiers;

/// Audit time utilities
pub mod time;

/// Test fixtures shared across crates
#[doc(hidden)]
pub mod test_utils;

pub use access::{
    AccessPrivilege, AccessProfile, AccessProfileEntry, AccessProfileRecord, EntryProperty,
    ProfileChange, ProfileState, SimUser, SimUserRole,
};
pub use config::ProjectConfig;
pub use errors::{ErrorKind, Result, SimError};
pub use id_generator::IdGenerator;
pub use identifiers::{Identifier, ProjectHandle};
pub use time::{Clock, ManualClock, SystemClock, Timestamp, EPOCH_MIN};
