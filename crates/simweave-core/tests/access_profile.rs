//! Access profile behavior: defaults, administrator union, audit stamping and
//! the derived validity state.

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use proptest::prelude::*;
use simweave_core::test_utils::ts;
use simweave_core::{
    AccessPrivilege, AccessProfile, ProfileState, SimError, SimUserRole, EPOCH_MIN,
};

fn any_role() -> impl Strategy<Value = SimUserRole> {
    prop::sample::select(SimUserRole::all().collect::<Vec<_>>())
}

fn any_privilege() -> impl Strategy<Value = AccessPrivilege> {
    (0u8..16).prop_map(AccessPrivilege::from_bits_truncate)
}

/// Profile where FIRE_SAFETY holds WRITE|SUPERVIZE|RELEASE and ARCHITECTURE
/// holds READ|SUPERVIZE|RELEASE.
fn fire_safety_profile() -> AccessProfile {
    let mut profile = AccessProfile::new(SimUserRole::BuildingPhysics);
    profile.set_access(
        SimUserRole::FireSafety,
        AccessPrivilege::WRITE | AccessPrivilege::SUPERVIZE | AccessPrivilege::RELEASE,
    );
    profile.set_access(
        SimUserRole::Architecture,
        AccessPrivilege::READ | AccessPrivilege::SUPERVIZE | AccessPrivilege::RELEASE,
    );
    profile
}

proptest! {
    #[test]
    fn fresh_profile_defaults(creator in any_role()) {
        let profile = AccessProfile::new(creator);
        for entry in profile.entries() {
            let role = entry.role();
            if role == creator || role == SimUserRole::Administrator {
                prop_assert_eq!(entry.stored_access(), AccessPrivilege::READ_WRITE);
            } else {
                prop_assert_eq!(entry.stored_access(), AccessPrivilege::NONE);
            }
            prop_assert_eq!(entry.last_write(), EPOCH_MIN);
            prop_assert_eq!(entry.last_supervize(), EPOCH_MIN);
            prop_assert_eq!(entry.last_release(), EPOCH_MIN);
        }
    }

    #[test]
    fn reset_access_flags_is_idempotent(
        creator in any_role(),
        reset_to in any_role(),
        grants in prop::collection::vec((any_role(), any_privilege()), 0..8),
    ) {
        let mut profile = AccessProfile::new(creator);
        for (role, access) in grants {
            profile.set_access(role, access);
        }

        profile.reset_access_flags(reset_to);
        let once = profile.clone();
        let second_changes = profile.reset_access_flags(reset_to);

        prop_assert!(second_changes.is_empty());
        prop_assert_eq!(&profile, &once);
        for entry in profile.entries() {
            let expected = if entry.role() == reset_to || entry.role() == SimUserRole::Administrator {
                AccessPrivilege::READ_WRITE
            } else {
                AccessPrivilege::NONE
            };
            prop_assert_eq!(entry.stored_access(), expected);
        }
    }

    #[test]
    fn ordered_stamps_are_valid(a in 0i64..1000, b in 0i64..1000, c in 0i64..1000) {
        let mut sorted = [a, b, c];
        sorted.sort_unstable();
        prop_assert_eq!(
            ProfileState::from_maxima(ts(sorted[0]), ts(sorted[1]), ts(sorted[2])),
            ProfileState::Valid
        );
    }

    #[test]
    fn state_matches_table(w in 0i64..50, s in 0i64..50, r in 0i64..50) {
        let expected = if w > r && s <= r {
            ProfileState::WriteAfterRelease
        } else if w > s {
            ProfileState::WriteAfterSupervize
        } else if s > r {
            ProfileState::SupervizeAfterRelease
        } else {
            ProfileState::Valid
        };
        prop_assert_eq!(ProfileState::from_maxima(ts(w), ts(s), ts(r)), expected);
    }

    #[test]
    fn administrator_always_reads_and_writes(stored in any_privilege(), creator in any_role()) {
        let mut profile = AccessProfile::new(creator);
        profile.set_access(SimUserRole::Administrator, stored);
        let effective = profile.effective_access(SimUserRole::Administrator);
        prop_assert!(effective.contains(AccessPrivilege::READ_WRITE));
        prop_assert!(effective.contains(stored));
        prop_assert_eq!(profile[SimUserRole::Administrator].stored_access(), stored);
    }
}

#[test]
fn administrator_union_adds_write() {
    let mut profile = AccessProfile::new(SimUserRole::Architecture);
    profile.set_access(
        SimUserRole::Administrator,
        AccessPrivilege::READ | AccessPrivilege::RELEASE,
    );
    assert_eq!(
        profile.effective_access(SimUserRole::Administrator),
        AccessPrivilege::READ | AccessPrivilege::WRITE | AccessPrivilege::RELEASE
    );
}

#[test]
fn administrator_inherits_creator_privileges_at_read_time() {
    let mut profile = AccessProfile::new(SimUserRole::Architecture);
    profile.set_access(SimUserRole::Administrator, AccessPrivilege::NONE);
    assert!(!profile.has_access(SimUserRole::Administrator, AccessPrivilege::RELEASE));

    profile.set_access(SimUserRole::Architecture, AccessPrivilege::ALL);
    assert!(profile.has_access(SimUserRole::Administrator, AccessPrivilege::RELEASE));
    assert_eq!(
        profile[SimUserRole::Administrator].stored_access(),
        AccessPrivilege::NONE
    );
}

#[test]
fn stamping_without_privilege_is_denied_and_changes_nothing() {
    let mut profile = fire_safety_profile();
    let before = profile.clone();

    let err = profile
        .set_timestamp(SimUserRole::Architecture, AccessPrivilege::WRITE, ts(5))
        .unwrap_err();

    assert_matches!(err, SimError::AccessDenied { .. });
    assert_eq!(profile, before);
    assert_eq!(profile.state(), before.state());
}

#[test]
fn denial_wins_over_ordering() {
    let mut profile = AccessProfile::new(SimUserRole::Architecture);
    profile.set_access(SimUserRole::FireSafety, AccessPrivilege::WRITE);
    profile
        .set_timestamp(SimUserRole::FireSafety, AccessPrivilege::WRITE, ts(10))
        .unwrap();
    // FIRE_SAFETY lacks SUPERVIZE, and the stamp would also precede its last write.
    let err = profile
        .set_timestamp(SimUserRole::FireSafety, AccessPrivilege::SUPERVIZE, ts(0))
        .unwrap_err();
    assert_matches!(err, SimError::AccessDenied { .. });
}

#[test]
fn last_access_returns_latest_writer() {
    let mut profile = fire_safety_profile();
    profile
        .set_timestamp(SimUserRole::FireSafety, AccessPrivilege::WRITE, ts(20))
        .unwrap();
    profile
        .set_timestamp(SimUserRole::Architecture, AccessPrivilege::SUPERVIZE, ts(30))
        .unwrap();

    assert_eq!(
        profile.last_access(AccessPrivilege::WRITE).unwrap(),
        (SimUserRole::FireSafety, ts(20))
    );
    assert_eq!(
        profile.last_access(AccessPrivilege::SUPERVIZE).unwrap(),
        (SimUserRole::Architecture, ts(30))
    );
    assert_eq!(profile.state(), ProfileState::SupervizeAfterRelease);
}

#[test]
fn last_access_rejects_unaudited_privileges() {
    let profile = fire_safety_profile();
    for privilege in [
        AccessPrivilege::READ,
        AccessPrivilege::ALL,
        AccessPrivilege::NONE,
    ] {
        assert_matches!(
            profile.last_access(privilege),
            Err(SimError::UnsupportedOperation { .. })
        );
    }
}

#[test]
fn release_requires_prior_supervision_order() {
    let mut profile = fire_safety_profile();
    let role = SimUserRole::FireSafety;
    profile.set_timestamp(role, AccessPrivilege::WRITE, ts(1)).unwrap();
    profile.set_timestamp(role, AccessPrivilege::SUPERVIZE, ts(5)).unwrap();

    assert_matches!(
        profile.set_timestamp(role, AccessPrivilege::RELEASE, ts(3)),
        Err(SimError::InvalidOrdering { .. })
    );
    profile.set_timestamp(role, AccessPrivilege::RELEASE, ts(5)).unwrap();
    assert_eq!(profile.state(), ProfileState::Valid);

    profile.set_timestamp(role, AccessPrivilege::WRITE, ts(9)).unwrap();
    assert_eq!(profile.state(), ProfileState::WriteAfterRelease);
}
