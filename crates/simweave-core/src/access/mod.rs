//! Roles, privileges and per-component access profiles

pub mod privilege;
pub mod profile;
pub mod role;

pub use privilege::AccessPrivilege;
pub use profile::{
    AccessProfile, AccessProfileEntry, AccessProfileRecord, EntryProperty, ProfileChange,
    ProfileState,
};
pub use role::{SimUser, SimUserRole};
