//! Access profile mutations routed through the project
//!
//! Profile changes on a component are turned into `AccessChanged`
//! notifications here, so listeners see grants and audit stamps the same way
//! they see collection changes.

use crate::events::ProjectEvent;
use crate::object::ComponentKey;
use crate::project::Project;
use simweave_core::{AccessPrivilege, Result, SimError, SimUser, SimUserRole};
use tracing::{debug, warn};

impl Project {
    /// Grant `access` to `role` on `component`
    ///
    /// The acting user needs write access on the component; the grant itself
    /// is stamped as a write.
    pub fn set_role_access(
        &mut self,
        user: &SimUser,
        component: ComponentKey,
        role: SimUserRole,
        access: AccessPrivilege,
    ) -> Result<()> {
        self.require_write(user, &[component], "set role access")?;
        let stamp = self.prepare_stamp(user, &[component])?;

        self.apply_stamp(user, &stamp);
        if let Some(node) = self.components.get_mut(component) {
            let change = node.access.set_access(role, access);
            self.emit(ProjectEvent::AccessChanged { component, change });
        }
        debug!(?component, %role, %access, user = user.name(), "Role access set");
        self.finish(())
    }

    /// Restore default grants on `component` for `creator`
    pub fn reset_access_flags(
        &mut self,
        user: &SimUser,
        component: ComponentKey,
        creator: SimUserRole,
    ) -> Result<()> {
        self.require_write(user, &[component], "reset access flags")?;
        let stamp = self.prepare_stamp(user, &[component])?;

        self.apply_stamp(user, &stamp);
        if let Some(node) = self.components.get_mut(component) {
            let changes = node.access.reset_access_flags(creator);
            for change in changes {
                self.emit(ProjectEvent::AccessChanged { component, change });
            }
        }
        debug!(?component, %creator, user = user.name(), "Access flags reset");
        self.finish(())
    }

    /// Stamp the audit timestamp of `privilege` for the acting role at now
    ///
    /// Privilege and ordering are always enforced, even inside a disabled
    /// access checking scope.
    pub fn record_access(
        &mut self,
        user: &SimUser,
        component: ComponentKey,
        privilege: AccessPrivilege,
    ) -> Result<()> {
        let at = self.now();
        let node = self.node(component)?;
        if let Err(error) = node.access.check_timestamp(user.role(), privilege, at) {
            warn!(
                %error,
                user = user.name(),
                component = node.name.as_str(),
                %privilege,
                "Audit stamp rejected"
            );
            return Err(error);
        }

        let change = self
            .components
            .get_mut(component)
            .ok_or_else(|| SimError::invalid_argument(format!("unknown component {component:?}")))?
            .access
            .set_timestamp(user.role(), privilege, at)?;
        self.emit(ProjectEvent::AccessChanged { component, change });
        debug!(?component, %privilege, user = user.name(), "Access recorded");
        self.finish(())
    }

    /// Record a supervision of `component` by the acting user
    pub fn supervize(&mut self, user: &SimUser, component: ComponentKey) -> Result<()> {
        self.record_access(user, component, AccessPrivilege::SUPERVIZE)
    }

    /// Record a release of `component` by the acting user
    pub fn release(&mut self, user: &SimUser, component: ComponentKey) -> Result<()> {
        self.record_access(user, component, AccessPrivilege::RELEASE)
    }
}
