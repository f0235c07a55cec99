use std::collections::BTreeMap;

use log::{debug, info, warn};

use checks_core::error::LedgerError;
use checks_core::events::{EventSink, LedgerEvent};
use checks_core::id::Identity;
use checks_core::roles::{Role, RoleSet};

/// Read-only view of role membership used to authorize callers
pub trait RoleAuthority {
    fn has_role(&self, identity: &Identity, role: Role) -> bool;
}

/// Role membership for a single deployed contract.
///
/// The deployer is made Admin and Minter at construction. Admin is never
/// revoked here, so at least one Admin always exists.
#[derive(Debug, Clone)]
pub struct AccessControl {
    /// Roles held by each identity; identities with no roles are not stored
    members: BTreeMap<Identity, RoleSet>,
}

impl AccessControl {
    /// Create role state for a new deployment
    pub fn initialize(deployer: Identity, events: &mut impl EventSink) -> Result<Self, LedgerError> {
        if deployer.is_null() {
            return Err(LedgerError::InvalidDeployer);
        }

        let mut access = Self {
            members: BTreeMap::new(),
        };
        for role in Role::ALL {
            access.grant(role, deployer, deployer, events);
        }

        info!("Access control initialized with admin {}", deployer);
        Ok(access)
    }

    pub fn has_role(&self, identity: &Identity, role: Role) -> bool {
        self.members
            .get(identity)
            .map(|roles| roles.contains(role))
            .unwrap_or(false)
    }

    /// Roles held by an identity
    pub fn roles_of(&self, identity: &Identity) -> RoleSet {
        self.members.get(identity).copied().unwrap_or_default()
    }

    /// Grant the minter role to `target`
    ///
    /// # Errors
    /// * `CallerNotAdmin` - `caller` does not hold Admin
    /// * `InvalidMinter` - `target` is the null identity
    pub fn set_minter(
        &mut self,
        caller: &Identity,
        target: &Identity,
        events: &mut impl EventSink,
    ) -> Result<(), LedgerError> {
        if let Err(err) = self.check_minter_change(caller, target) {
            warn!("set_minter by {} rejected: {}", caller, err);
            return Err(err);
        }

        if !self.grant(Role::Minter, *target, *caller, events) {
            debug!("{} already holds {}", target, Role::Minter);
        }
        Ok(())
    }

    /// Revoke the minter role from `target`, with the same checks as `set_minter`
    pub fn remove_minter(
        &mut self,
        caller: &Identity,
        target: &Identity,
        events: &mut impl EventSink,
    ) -> Result<(), LedgerError> {
        if let Err(err) = self.check_minter_change(caller, target) {
            warn!("remove_minter by {} rejected: {}", caller, err);
            return Err(err);
        }

        if !self.revoke(Role::Minter, *target, *caller, events) {
            debug!("{} does not hold {}", target, Role::Minter);
        }
        Ok(())
    }

    /// Number of identities holding `role`
    pub fn role_member_count(&self, role: Role) -> usize {
        self.members.values().filter(|roles| roles.contains(role)).count()
    }

    /// Holder of `role` at `index`, in ascending identity order
    pub fn role_member(&self, role: Role, index: usize) -> Result<Identity, LedgerError> {
        self.members_with(role)
            .nth(index)
            .ok_or(LedgerError::RoleMemberNotFound { role, index })
    }

    pub fn role_members(&self, role: Role) -> Vec<Identity> {
        self.members_with(role).collect()
    }

    fn members_with(&self, role: Role) -> impl Iterator<Item = Identity> + '_ {
        self.members
            .iter()
            .filter(move |(_, roles)| roles.contains(role))
            .map(|(identity, _)| *identity)
    }

    fn check_minter_change(&self, caller: &Identity, target: &Identity) -> Result<(), LedgerError> {
        if !self.has_role(caller, Role::Admin) {
            return Err(LedgerError::CallerNotAdmin);
        }
        if target.is_null() {
            return Err(LedgerError::InvalidMinter);
        }
        Ok(())
    }

    fn grant(
        &mut self,
        role: Role,
        account: Identity,
        sender: Identity,
        events: &mut impl EventSink,
    ) -> bool {
        let added = self.members.entry(account).or_default().insert(role);
        if added {
            info!("{} granted to {} by {}", role, account, sender);
            events.emit(LedgerEvent::RoleGranted {
                role,
                account,
                sender,
            });
        }
        added
    }

    fn revoke(
        &mut self,
        role: Role,
        account: Identity,
        sender: Identity,
        events: &mut impl EventSink,
    ) -> bool {
        let Some(roles) = self.members.get_mut(&account) else {
            return false;
        };
        let held = roles.remove(role);
        if roles.is_empty() {
            self.members.remove(&account);
        }
        if held {
            info!("{} revoked from {} by {}", role, account, sender);
            events.emit(LedgerEvent::RoleRevoked {
                role,
                account,
                sender,
            });
        }
        held
    }
}

impl RoleAuthority for AccessControl {
    fn has_role(&self, identity: &Identity, role: Role) -> bool {
        AccessControl::has_role(self, identity, role)
    }
}
