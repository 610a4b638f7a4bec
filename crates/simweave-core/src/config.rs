//! Project configuration
//!
//! Configuration is layered the usual way: defaults, then a TOML file, then
//! `SIMWEAVE_*` environment variables, then validation.
//!
//! ```toml
//! access_checking = true
//! default_creator_role = "ARCHITECTURE"
//! default_slot = "Undefined Slot"
//! ```

use crate::access::SimUserRole;
use crate::errors::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "SIMWEAVE_";

/// Slot assigned to components created without an explicit slot
pub const DEFAULT_SLOT: &str = "Undefined Slot";

/// Runtime configuration of one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Enforce write checks on collection mutations
    pub access_checking: bool,
    /// Role recorded as creator when none is supplied
    pub default_creator_role: SimUserRole,
    /// Taxonomy key of the default slot
    pub default_slot: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            access_checking: true,
            default_creator_role: SimUserRole::Administrator,
            default_slot: DEFAULT_SLOT.to_string(),
        }
    }
}

impl ProjectConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SimError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loading project configuration");
        Self::from_toml_str(&content)
    }

    /// Apply `SIMWEAVE_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `SIMWEAVE_*` overrides from an explicit variable list
    pub fn merge_with_vars(
        &mut self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<()> {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            self.set_from_string(&name.to_lowercase(), &value)?;
        }
        self.validate()
    }

    /// Set one configuration value from its string form
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "access_checking" => {
                self.access_checking = value.trim().parse().map_err(|_| {
                    SimError::config(format!("access_checking expects true or false, got {value:?}"))
                })?;
            }
            "default_creator_role" => {
                self.default_creator_role = SimUserRole::from_str(value.trim())
                    .map_err(|_| SimError::config(format!("unknown role {value:?}")))?;
            }
            "default_slot" => self.default_slot = value.trim().to_string(),
            other => tracing::debug!(key = other, "ignoring unknown configuration key"),
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_slot.trim().is_empty() {
            return Err(SimError::config("default_slot must not be empty"));
        }
        Ok(())
    }
}
