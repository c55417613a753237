//! Roles and the user/role association.
//!
//! `Admin` and `SuperAdmin` are system-reserved: they are seeded at bootstrap
//! and cannot be recreated or shadowed through [`Role::new`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

pub const ROLE_SUPER_ADMIN: &str = "SuperAdmin";
pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_VISITOR: &str = "Visitor";
pub const MAX_ROLE_NAME_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

impl Role {
    /// Create a user-defined role.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRoleName`] for an empty or overlong name,
    /// [`Error::ReservedRole`] for the built-in role names.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if name.is_empty() || name.len() > MAX_ROLE_NAME_LEN {
            return Err(Error::InvalidRoleName);
        }
        if is_admin_role(&name) {
            return Err(Error::ReservedRole(name));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description: description.into(),
        })
    }

    /// Create a system role, bypassing the reserved-name check. Seeding only.
    #[must_use]
    pub(crate) fn builtin(name: &str, description: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    #[must_use]
    pub fn is_builtin(&self) -> bool {
        is_admin_role(&self.name)
    }
}

/// Whether `name` grants administrative access.
#[must_use]
pub fn is_admin_role(name: &str) -> bool {
    name.eq_ignore_ascii_case(ROLE_ADMIN) || name.eq_ignore_ascii_case(ROLE_SUPER_ADMIN)
}

/// A user/role association, unique per `(user_id, role_id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

/// The set of roles held by one user, addressed by role id.
#[derive(Debug, Clone)]
pub struct RoleAssignments {
    user_id: Uuid,
    role_ids: Vec<Uuid>,
}

impl RoleAssignments {
    #[must_use]
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            role_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_pairs(user_id: Uuid, pairs: &[UserRole]) -> Self {
        let role_ids = pairs
            .iter()
            .filter(|pair| pair.user_id == user_id)
            .map(|pair| pair.role_id)
            .collect();
        Self { user_id, role_ids }
    }

    /// Assign a role.
    ///
    /// # Errors
    ///
    /// [`Error::RoleAlreadyAssigned`] when the user already holds the role.
    pub fn assign(&mut self, role_id: Uuid) -> Result<(), Error> {
        if self.has(role_id) {
            return Err(Error::RoleAlreadyAssigned);
        }
        self.role_ids.push(role_id);
        Ok(())
    }

    /// Remove a role; `false` when the user did not hold it.
    pub fn remove(&mut self, role_id: Uuid) -> bool {
        let before = self.role_ids.len();
        self.role_ids.retain(|id| *id != role_id);
        self.role_ids.len() < before
    }

    #[must_use]
    pub fn has(&self, role_id: Uuid) -> bool {
        self.role_ids.contains(&role_id)
    }

    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    #[must_use]
    pub fn role_ids(&self) -> &[Uuid] {
        &self.role_ids
    }

    /// Render the association as join records.
    #[must_use]
    pub fn pairs(&self) -> Vec<UserRole> {
        self.role_ids
            .iter()
            .map(|role_id| UserRole {
                user_id: self.user_id,
                role_id: *role_id,
            })
            .collect()
    }
}
