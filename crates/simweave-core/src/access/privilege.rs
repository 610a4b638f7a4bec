//! Privilege flags granted per role and component
//!
//! ```
//! use simweave_core::AccessPrivilege;
//!
//! let granted = AccessPrivilege::READ | AccessPrivilege::WRITE;
//! assert!(granted.contains(AccessPrivilege::WRITE));
//! assert!(!granted.contains(AccessPrivilege::RELEASE));
//! assert!(AccessPrivilege::WRITE.audited());
//! assert!(!AccessPrivilege::READ.audited());
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Privileges a role may hold on a component
    ///
    /// | Privilege | Audit timestamp |
    /// |-----------|-----------------|
    /// | [`READ`](Self::READ) | none |
    /// | [`WRITE`](Self::WRITE) | `last_write` |
    /// | [`SUPERVIZE`](Self::SUPERVIZE) | `last_supervize` |
    /// | [`RELEASE`](Self::RELEASE) | `last_release` |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AccessPrivilege: u8 {
        /// Read the component
        const READ      = 0b0001;
        /// Modify the component and its collections
        const WRITE     = 0b0010;
        /// Supervize changes made by others
        const SUPERVIZE = 0b0100;
        /// Release the component
        const RELEASE   = 0b1000;
    }
}

impl AccessPrivilege {
    /// No privilege
    pub const NONE: Self = Self::empty();

    /// Read and write, the default grant for creators and administrators
    pub const READ_WRITE: Self = Self::READ.union(Self::WRITE);

    /// Every privilege
    pub const ALL: Self = Self::READ_WRITE.union(Self::SUPERVIZE).union(Self::RELEASE);

    /// Whether this is exactly one privilege that carries an audit timestamp
    pub fn audited(self) -> bool {
        self == Self::WRITE || self == Self::SUPERVIZE || self == Self::RELEASE
    }

    /// Human-readable list of privilege names
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl fmt::Display for AccessPrivilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        f.write_str(&self.names().join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_sets() {
        assert_eq!(AccessPrivilege::NONE, AccessPrivilege::default());
        assert_eq!(AccessPrivilege::ALL, AccessPrivilege::all());
        assert!(AccessPrivilege::ALL.contains(AccessPrivilege::RELEASE));
    }

    #[test]
    fn only_single_audit_flags_are_audited() {
        assert!(AccessPrivilege::SUPERVIZE.audited());
        assert!(!AccessPrivilege::NONE.audited());
        assert!(!AccessPrivilege::ALL.audited());
        assert!(!(AccessPrivilege::WRITE | AccessPrivilege::RELEASE).audited());
    }

    #[test]
    fn display_lists_flags() {
        assert_eq!(AccessPrivilege::NONE.to_string(), "NONE");
        assert_eq!(AccessPrivilege::READ_WRITE.to_string(), "READ|WRITE");
    }
}
