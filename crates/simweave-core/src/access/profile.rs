//! Per-component access profile
//!
//! An [`AccessProfile`] holds one [`AccessProfileEntry`] for every
//! [`SimUserRole`]. Each entry stores the role's privilege flags and the audit
//! timestamps of its last write, supervize and release. The validity of the
//! whole profile is derived from the maxima of those timestamps across all
//! entries and is never stored.
//!
//! Mutators return a [`ProfileChange`]; the owning project turns it into an
//! access-changed notification.

use super::privilege::AccessPrivilege;
use super::role::SimUserRole;
use crate::errors::{Result, SimError};
use crate::time::{Timestamp, EPOCH_MIN};
use serde::{Deserialize, Serialize};
use std::ops::Index;
use strum::EnumCount;

/// Privilege flags and audit timestamps of one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessProfileEntry {
    role: SimUserRole,
    access: AccessPrivilege,
    last_write: Timestamp,
    last_supervize: Timestamp,
    last_release: Timestamp,
}

impl AccessProfileEntry {
    /// Create an entry that was never stamped
    pub fn new(role: SimUserRole, access: AccessPrivilege) -> Self {
        Self::restore(role, access, EPOCH_MIN, EPOCH_MIN, EPOCH_MIN)
    }

    /// Rebuild an entry from loaded values without any checks
    pub fn restore(
        role: SimUserRole,
        access: AccessPrivilege,
        last_write: Timestamp,
        last_supervize: Timestamp,
        last_release: Timestamp,
    ) -> Self {
        Self {
            role,
            access,
            last_write,
            last_supervize,
            last_release,
        }
    }

    /// Role this entry belongs to
    pub fn role(&self) -> SimUserRole {
        self.role
    }

    /// Privileges as stored, without the administrator union
    pub fn stored_access(&self) -> AccessPrivilege {
        self.access
    }

    /// Time of the last recorded write
    pub fn last_write(&self) -> Timestamp {
        self.last_write
    }

    /// Time of the last recorded supervision
    pub fn last_supervize(&self) -> Timestamp {
        self.last_supervize
    }

    /// Time of the last recorded release
    pub fn last_release(&self) -> Timestamp {
        self.last_release
    }

    /// Audit timestamp belonging to `privilege`, if it has one
    pub fn timestamp(&self, privilege: AccessPrivilege) -> Option<Timestamp> {
        if privilege == AccessPrivilege::WRITE {
            Some(self.last_write)
        } else if privilege == AccessPrivilege::SUPERVIZE {
            Some(self.last_supervize)
        } else if privilege == AccessPrivilege::RELEASE {
            Some(self.last_release)
        } else {
            None
        }
    }

    fn check_ordering(&self, privilege: AccessPrivilege, at: Timestamp) -> Result<()> {
        let (current, floor, floor_name) = if privilege == AccessPrivilege::WRITE {
            (self.last_write, EPOCH_MIN, "")
        } else if privilege == AccessPrivilege::SUPERVIZE {
            (self.last_supervize, self.last_write, "write")
        } else {
            (self.last_release, self.last_supervize, "supervize")
        };

        if at < current {
            return Err(SimError::invalid_ordering(format!(
                "{privilege} timestamp of {} would move back from {current} to {at}",
                self.role
            )));
        }
        if at < floor {
            return Err(SimError::invalid_ordering(format!(
                "{privilege} timestamp {at} of {} precedes its last {floor_name} at {floor}",
                self.role
            )));
        }
        Ok(())
    }

    fn stamp(&mut self, privilege: AccessPrivilege, at: Timestamp) {
        if privilege == AccessPrivilege::WRITE {
            self.last_write = at;
        } else if privilege == AccessPrivilege::SUPERVIZE {
            self.last_supervize = at;
        } else if privilege == AccessPrivilege::RELEASE {
            self.last_release = at;
        }
    }
}

/// Ordering consistency of a profile's audit timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileState {
    /// write ≤ supervize ≤ release
    Valid,
    /// Written after the last release, and the release followed supervision
    WriteAfterRelease,
    /// Written after the last supervision
    WriteAfterSupervize,
    /// Supervized after the last release
    SupervizeAfterRelease,
}

impl ProfileState {
    /// Classify the maxima of the write, supervize and release timestamps
    pub fn from_maxima(write: Timestamp, supervize: Timestamp, release: Timestamp) -> Self {
        if write > release && supervize <= release {
            Self::WriteAfterRelease
        } else if write > supervize {
            Self::WriteAfterSupervize
        } else if supervize > release {
            Self::SupervizeAfterRelease
        } else {
            Self::Valid
        }
    }

    /// Whether the profile is consistent
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

/// Property of an entry touched by a profile mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryProperty {
    /// Privilege flags
    Access,
    /// `last_write`
    LastWrite,
    /// `last_supervize`
    LastSupervize,
    /// `last_release`
    LastRelease,
}

impl EntryProperty {
    fn for_privilege(privilege: AccessPrivilege) -> Self {
        if privilege == AccessPrivilege::WRITE {
            Self::LastWrite
        } else if privilege == AccessPrivilege::SUPERVIZE {
            Self::LastSupervize
        } else {
            Self::LastRelease
        }
    }
}

/// Description of one committed profile mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileChange {
    /// Role whose entry changed
    pub role: SimUserRole,
    /// Property that changed
    pub property: EntryProperty,
    /// Profile state before the change
    pub previous_state: ProfileState,
    /// Profile state after the change
    pub state: ProfileState,
}

/// Serialized shape of an [`AccessProfile`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessProfileRecord {
    /// Role that created the owning component
    pub creator: SimUserRole,
    /// Stored entries, possibly incomplete
    pub entries: Vec<AccessProfileEntry>,
}

/// Complete role → entry table of one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AccessProfileRecord", into = "AccessProfileRecord")]
pub struct AccessProfile {
    creator: SimUserRole,
    entries: Vec<AccessProfileEntry>,
}

impl AccessProfile {
    /// Create the profile of a component created by `creator`
    ///
    /// Administrator and `creator` receive read and write, all other roles
    /// nothing; every timestamp starts at [`EPOCH_MIN`].
    pub fn new(creator: SimUserRole) -> Self {
        let mut profile = Self {
            creator,
            entries: SimUserRole::all()
                .map(|role| AccessProfileEntry::new(role, AccessPrivilege::NONE))
                .collect(),
        };
        profile.reset_access_flags(creator);
        profile
    }

    /// Rebuild a profile from loaded entries without authorization or ordering checks
    ///
    /// Roles missing from `entries` get an empty, unstamped entry; later
    /// duplicates of a role win.
    pub fn restore(
        creator: SimUserRole,
        entries: impl IntoIterator<Item = AccessProfileEntry>,
    ) -> Self {
        let mut table: Vec<AccessProfileEntry> = SimUserRole::all()
            .map(|role| AccessProfileEntry::new(role, AccessPrivilege::NONE))
            .collect();
        for entry in entries {
            let index = entry.role.index();
            table[index] = entry;
        }
        Self {
            creator,
            entries: table,
        }
    }

    /// Role that created the owning component
    pub fn creator(&self) -> SimUserRole {
        self.creator
    }

    /// All entries in role declaration order
    pub fn entries(&self) -> impl Iterator<Item = &AccessProfileEntry> {
        self.entries.iter()
    }

    /// Number of entries, always one per role
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.entries.len(), SimUserRole::COUNT);
        self.entries.len()
    }

    /// Never true; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Privileges `role` effectively holds
    ///
    /// For the administrator this is the stored value unioned with the
    /// creator's stored privileges and read/write; it is derived on every call.
    pub fn effective_access(&self, role: SimUserRole) -> AccessPrivilege {
        let stored = self[role].access;
        if role == SimUserRole::Administrator {
            stored | self[self.creator].access | AccessPrivilege::READ_WRITE
        } else {
            stored
        }
    }

    /// Whether `role` holds every flag of `privilege`
    pub fn has_access(&self, role: SimUserRole, privilege: AccessPrivilege) -> bool {
        self.effective_access(role).contains(privilege)
    }

    /// Grant exactly read and write to the administrator and `creator`, nothing to others
    ///
    /// Returns one change per entry whose stored flags changed.
    pub fn reset_access_flags(&mut self, creator: SimUserRole) -> Vec<ProfileChange> {
        let previous_state = self.state();
        self.creator = creator;
        let mut changes = Vec::new();
        for entry in &mut self.entries {
            let access = if entry.role == SimUserRole::Administrator || entry.role == creator {
                AccessPrivilege::READ_WRITE
            } else {
                AccessPrivilege::NONE
            };
            if entry.access != access {
                entry.access = access;
                changes.push(entry.role);
            }
        }
        let state = self.state();
        changes
            .into_iter()
            .map(|role| ProfileChange {
                role,
                property: EntryProperty::Access,
                previous_state,
                state,
            })
            .collect()
    }

    /// Store `access` for `role`
    ///
    /// For the administrator the raw value is stored; the union with the
    /// creator's privileges is re-derived on read.
    pub fn set_access(&mut self, role: SimUserRole, access: AccessPrivilege) -> ProfileChange {
        let previous_state = self.state();
        self.entries[role.index()].access = access;
        ProfileChange {
            role,
            property: EntryProperty::Access,
            previous_state,
            state: self.state(),
        }
    }

    /// Validate stamping `privilege` for `role` at `at` without changing anything
    pub fn check_timestamp(
        &self,
        role: SimUserRole,
        privilege: AccessPrivilege,
        at: Timestamp,
    ) -> Result<()> {
        if !privilege.audited() {
            return Err(SimError::unsupported(format!(
                "{privilege} has no audit timestamp"
            )));
        }
        if !self.has_access(role, privilege) {
            return Err(SimError::access_denied(format!(
                "role {role} does not hold {privilege}"
            )));
        }
        self[role].check_ordering(privilege, at)
    }

    /// Stamp the audit timestamp of `privilege` for `role`
    ///
    /// Fails with access denied when the role lacks the privilege and with an
    /// ordering error when the stamp would break write → supervize → release.
    pub fn set_timestamp(
        &mut self,
        role: SimUserRole,
        privilege: AccessPrivilege,
        at: Timestamp,
    ) -> Result<ProfileChange> {
        self.check_timestamp(role, privilege, at)?;
        let previous_state = self.state();
        self.entries[role.index()].stamp(privilege, at);
        Ok(ProfileChange {
            role,
            property: EntryProperty::for_privilege(privilege),
            previous_state,
            state: self.state(),
        })
    }

    /// Role holding the latest timestamp of `privilege`, and that timestamp
    ///
    /// Ties resolve to the first role in declaration order.
    pub fn last_access(&self, privilege: AccessPrivilege) -> Result<(SimUserRole, Timestamp)> {
        if !privilege.audited() {
            return Err(SimError::unsupported(format!(
                "last access is undefined for {privilege}"
            )));
        }
        let mut latest: Option<(SimUserRole, Timestamp)> = None;
        for entry in &self.entries {
            let Some(at) = entry.timestamp(privilege) else {
                continue;
            };
            if latest.map_or(true, |(_, best)| at > best) {
                latest = Some((entry.role, at));
            }
        }
        latest.ok_or_else(|| SimError::not_found("access profile has no entries"))
    }

    /// Derived validity of the whole profile
    pub fn state(&self) -> ProfileState {
        let mut write = EPOCH_MIN;
        let mut supervize = EPOCH_MIN;
        let mut release = EPOCH_MIN;
        for entry in &self.entries {
            write = write.max(entry.last_write);
            supervize = supervize.max(entry.last_supervize);
            release = release.max(entry.last_release);
        }
        ProfileState::from_maxima(write, supervize, release)
    }
}

impl Index<SimUserRole> for AccessProfile {
    type Output = AccessProfileEntry;

    fn index(&self, role: SimUserRole) -> &Self::Output {
        &self.entries[role.index()]
    }
}

impl From<AccessProfileRecord> for AccessProfile {
    fn from(record: AccessProfileRecord) -> Self {
        Self::restore(record.creator, record.entries)
    }
}

impl From<AccessProfile> for AccessProfileRecord {
    fn from(profile: AccessProfile) -> Self {
        Self {
            creator: profile.creator,
            entries: profile.entries,
        }
    }
}
