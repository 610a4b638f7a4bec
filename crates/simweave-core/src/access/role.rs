//! Organizational roles and the acting user

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator};

/// Organizational role of a user
///
/// The set is closed: every access profile holds exactly one entry per role.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum SimUserRole {
    /// Project administrator
    Administrator,
    /// Moderator of the project team
    Moderator,
    /// Energy network operator
    EnergyNetworkOperator,
    /// Energy supplier
    EnergySupplier,
    /// Building developer
    BuildingDeveloper,
    /// Building operator
    BuildingOperator,
    /// Architecture
    Architecture,
    /// Fire safety
    FireSafety,
    /// Building physics
    BuildingPhysics,
    /// Mechanical, electrical and plumbing / HVAC
    Mep,
    /// Process measuring and control
    ProcessMeasuringControl,
    /// Building contractor
    BuildingContractor,
    /// Guest without default privileges
    Guest,
}

impl SimUserRole {
    /// Position of the role in declaration order
    pub fn index(self) -> usize {
        self as usize
    }

    /// All roles in declaration order
    pub fn all() -> impl Iterator<Item = SimUserRole> {
        Self::iter()
    }
}

/// The acting user supplied by the session store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimUser {
    name: String,
    role: SimUserRole,
}

impl SimUser {
    /// Create a user acting in `role`
    pub fn new(name: impl Into<String>, role: SimUserRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role used for every access check
    pub fn role(&self) -> SimUserRole {
        self.role
    }
}
