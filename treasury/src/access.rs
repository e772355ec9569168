//! Role/permission gate
//!
//! Roles are capability tags, not a hierarchy: an identity holds any set of
//! them, and every gated entry point names the roles allowed to invoke it.
//! The owner does not implicitly hold the governor or operator role.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{Result, TreasuryError};
use crate::types::Address;

/// Capability tag held by an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Single privileged identity fixed at construction
    Owner,
    /// May grant and revoke governor/operator membership
    Admin,
    /// Deposits funds (and disburses in some presets)
    Governor,
    /// Disburses on a cadence, no deposit rights
    Operator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Owner => "OWNER_ROLE",
            Role::Admin => "ADMIN_ROLE",
            Role::Governor => "GOVERNOR_ROLE",
            Role::Operator => "OPERATOR_ROLE",
        };
        f.write_str(name)
    }
}

/// Every gated entry point of the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Deposit,
    OwnerDisburse,
    GovernorDisburse,
    OperatorDisburse,
    Disburse,
    Configure,
    ReturnToken,
    Approve,
    ManageRoles,
}

/// Named permission layouts the treasury contract went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPreset {
    /// Owner performs every operation
    OwnerOnly,
    /// Owner configures, governors deposit, operators disburse
    #[default]
    Tiered,
}

/// Maps each operation to the roles allowed to invoke it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    rules: HashMap<Operation, Vec<Role>>,
}

impl AccessPolicy {
    pub fn from_preset(preset: AccessPreset) -> Self {
        use Operation::*;

        let mut rules = HashMap::new();
        match preset {
            AccessPreset::OwnerOnly => {
                for op in [
                    Deposit,
                    OwnerDisburse,
                    GovernorDisburse,
                    OperatorDisburse,
                    Disburse,
                    Configure,
                    ReturnToken,
                    Approve,
                    ManageRoles,
                ] {
                    rules.insert(op, vec![Role::Owner]);
                }
            }
            AccessPreset::Tiered => {
                rules.insert(Deposit, vec![Role::Governor]);
                rules.insert(OwnerDisburse, vec![Role::Owner]);
                rules.insert(GovernorDisburse, vec![Role::Governor, Role::Operator]);
                rules.insert(OperatorDisburse, vec![Role::Operator]);
                rules.insert(Disburse, vec![Role::Operator]);
                rules.insert(Configure, vec![Role::Owner]);
                rules.insert(ReturnToken, vec![Role::Owner]);
                rules.insert(Approve, vec![Role::Owner]);
                rules.insert(ManageRoles, vec![Role::Owner, Role::Admin]);
            }
        }

        Self { rules }
    }

    /// Override the roles allowed for one operation
    pub fn allow(&mut self, op: Operation, roles: Vec<Role>) {
        self.rules.insert(op, roles);
    }

    pub fn allowed_roles(&self, op: Operation) -> &[Role] {
        self.rules.get(&op).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::from_preset(AccessPreset::default())
    }
}

/// Identity -> role set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTable {
    members: HashMap<Address, HashSet<Role>>,
}

impl RoleTable {
    /// Table with the owner seeded
    pub fn with_owner(owner: Address) -> Self {
        let mut members = HashMap::new();
        members.insert(owner, HashSet::from([Role::Owner]));
        Self { members }
    }

    pub fn has_role(&self, who: &Address, role: Role) -> bool {
        self.members
            .get(who)
            .map(|roles| roles.contains(&role))
            .unwrap_or(false)
    }

    pub fn roles_of(&self, who: &Address) -> Vec<Role> {
        self.members
            .get(who)
            .map(|roles| roles.iter().copied().collect())
            .unwrap_or_default()
    }

    /// All identities holding `role`
    pub fn members(&self, role: Role) -> Vec<&Address> {
        let mut found: Vec<&Address> = self
            .members
            .iter()
            .filter(|(_, roles)| roles.contains(&role))
            .map(|(who, _)| who)
            .collect();
        found.sort();
        found
    }

    pub fn owner(&self) -> Option<&Address> {
        self.members(Role::Owner).into_iter().next()
    }

    /// Returns true if membership changed
    pub fn grant(&mut self, role: Role, who: &Address) -> Result<bool> {
        Self::check_mutable(role, who)?;
        Ok(self.members.entry(who.clone()).or_default().insert(role))
    }

    /// Returns true if membership changed
    pub fn revoke(&mut self, role: Role, who: &Address) -> Result<bool> {
        Self::check_mutable(role, who)?;
        let Some(roles) = self.members.get_mut(who) else {
            return Ok(false);
        };
        let removed = roles.remove(&role);
        if roles.is_empty() {
            self.members.remove(who);
        }
        Ok(removed)
    }

    fn check_mutable(role: Role, who: &Address) -> Result<()> {
        if role == Role::Owner {
            return Err(TreasuryError::OwnerRoleFixed);
        }
        if who.is_zero() {
            return Err(TreasuryError::InvalidAddress(format!(
                "cannot assign {} to the zero address",
                role
            )));
        }
        Ok(())
    }

    /// Check `caller` against the roles `policy` allows for `op`
    pub fn authorize(&self, policy: &AccessPolicy, caller: &Address, op: Operation) -> Result<()> {
        let allowed = policy.allowed_roles(op);
        if allowed.iter().any(|role| self.has_role(caller, *role)) {
            return Ok(());
        }

        // An operation with no rule is owner-only
        let required = allowed.first().copied().unwrap_or(Role::Owner);
        warn!("{:?} rejected: {} lacks {}", op, caller, required);
        Err(TreasuryError::Unauthorized {
            required,
            caller: caller.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    #[test]
    fn test_owner_seeded() {
        let table = RoleTable::with_owner(addr("owner"));
        assert!(table.has_role(&addr("owner"), Role::Owner));
        assert!(!table.has_role(&addr("owner"), Role::Governor));
        assert_eq!(table.owner(), Some(&addr("owner")));
    }

    #[test]
    fn test_grant_is_idempotent() {
        let mut table = RoleTable::with_owner(addr("owner"));
        assert!(table.grant(Role::Operator, &addr("op")).unwrap());
        assert!(!table.grant(Role::Operator, &addr("op")).unwrap());
        assert_eq!(table.members(Role::Operator), vec![&addr("op")]);
    }

    #[test]
    fn test_revoke_missing_role_succeeds() {
        let mut table = RoleTable::with_owner(addr("owner"));
        assert!(!table.revoke(Role::Governor, &addr("nobody")).unwrap());

        table.grant(Role::Governor, &addr("gov")).unwrap();
        assert!(table.revoke(Role::Governor, &addr("gov")).unwrap());
        assert!(!table.has_role(&addr("gov"), Role::Governor));
        assert!(table.roles_of(&addr("gov")).is_empty());
    }

    #[test]
    fn test_owner_role_cannot_change_hands() {
        let mut table = RoleTable::with_owner(addr("owner"));
        assert_eq!(
            table.grant(Role::Owner, &addr("other")),
            Err(TreasuryError::OwnerRoleFixed)
        );
        assert_eq!(
            table.revoke(Role::Owner, &addr("owner")),
            Err(TreasuryError::OwnerRoleFixed)
        );
    }

    #[test]
    fn test_zero_address_rejected() {
        let mut table = RoleTable::with_owner(addr("owner"));
        assert!(matches!(
            table.grant(Role::Operator, &Address::zero()),
            Err(TreasuryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_tiered_policy() {
        let policy = AccessPolicy::from_preset(AccessPreset::Tiered);
        let mut table = RoleTable::with_owner(addr("owner"));
        table.grant(Role::Governor, &addr("gov")).unwrap();
        table.grant(Role::Operator, &addr("op")).unwrap();

        assert!(table.authorize(&policy, &addr("gov"), Operation::Deposit).is_ok());
        assert_eq!(
            table.authorize(&policy, &addr("owner"), Operation::Deposit),
            Err(TreasuryError::Unauthorized {
                required: Role::Governor,
                caller: addr("owner"),
            })
        );
        assert!(table
            .authorize(&policy, &addr("op"), Operation::GovernorDisburse)
            .is_ok());
        assert!(table
            .authorize(&policy, &addr("gov"), Operation::OperatorDisburse)
            .is_err());
        assert!(table
            .authorize(&policy, &addr("owner"), Operation::Configure)
            .is_ok());
    }

    #[test]
    fn test_owner_only_policy() {
        let policy = AccessPolicy::from_preset(AccessPreset::OwnerOnly);
        let mut table = RoleTable::with_owner(addr("owner"));
        table.grant(Role::Governor, &addr("gov")).unwrap();

        assert!(table.authorize(&policy, &addr("owner"), Operation::Deposit).is_ok());
        assert!(table.authorize(&policy, &addr("owner"), Operation::Disburse).is_ok());
        assert!(table.authorize(&policy, &addr("gov"), Operation::Deposit).is_err());
    }

    #[test]
    fn test_admin_manages_roles() {
        let policy = AccessPolicy::default();
        let mut table = RoleTable::with_owner(addr("owner"));
        table.grant(Role::Admin, &addr("admin")).unwrap();

        assert!(table
            .authorize(&policy, &addr("admin"), Operation::ManageRoles)
            .is_ok());
        assert!(table
            .authorize(&policy, &addr("admin"), Operation::Configure)
            .is_err());
    }
}
