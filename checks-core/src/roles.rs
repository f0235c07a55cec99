use serde::{Deserialize, Serialize};
use std::fmt;

/// Named permission that an identity may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// May grant and revoke the minter role
    Admin,
    /// May mint new token records
    Minter,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Admin, Role::Minter];

    fn bit(self) -> u8 {
        match self {
            Role::Admin => 0b01,
            Role::Minter => 0b10,
        }
    }

    /// Canonical role name as used by existing tooling
    pub fn name(&self) -> &'static str {
        match self {
            Role::Admin => "DEFAULT_ADMIN_ROLE",
            Role::Minter => "MINTER_ROLE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bitset of roles held by a single identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(u8);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Add a role, returning true if it was not already held
    pub fn insert(&mut self, role: Role) -> bool {
        let added = !self.contains(role);
        self.0 |= role.bit();
        added
    }

    /// Remove a role, returning true if it was held
    pub fn remove(&mut self, role: Role) -> bool {
        let held = self.contains(role);
        self.0 &= !role.bit();
        held
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(move |role| self.contains(*role))
    }
}
