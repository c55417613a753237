//! Permissions and the role/permission association.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// "May perform `action` on `resource`". Identity is the pair, not the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub resource: String,
    pub action: String,
    pub description: String,
}

impl Permission {
    #[must_use]
    pub fn new(
        resource: impl Into<String>,
        action: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource: resource.into(),
            action: action.into(),
            description: description.into(),
        }
    }

    /// The claim form embedded in tokens.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource, self.action)
    }

    #[must_use]
    pub fn matches(&self, resource: &str, action: &str) -> bool {
        self.resource == resource && self.action == action
    }
}

/// A role/permission association, unique per `(role_id, permission_id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub role_id: Uuid,
    pub permission_id: Uuid,
}

/// The permissions granted to one role, addressed by permission id.
#[derive(Debug, Clone)]
pub struct PermissionGrants {
    role_id: Uuid,
    permission_ids: Vec<Uuid>,
}

impl PermissionGrants {
    #[must_use]
    pub fn new(role_id: Uuid) -> Self {
        Self {
            role_id,
            permission_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_pairs(role_id: Uuid, pairs: &[RolePermission]) -> Self {
        let permission_ids = pairs
            .iter()
            .filter(|pair| pair.role_id == role_id)
            .map(|pair| pair.permission_id)
            .collect();
        Self {
            role_id,
            permission_ids,
        }
    }

    /// Grant a permission.
    ///
    /// # Errors
    ///
    /// [`Error::PermissionAlreadyGranted`] when the pair already exists.
    pub fn grant(&mut self, permission_id: Uuid) -> Result<(), Error> {
        if self.has(permission_id) {
            return Err(Error::PermissionAlreadyGranted);
        }
        self.permission_ids.push(permission_id);
        Ok(())
    }

    #[must_use]
    pub fn has(&self, permission_id: Uuid) -> bool {
        self.permission_ids.contains(&permission_id)
    }

    #[must_use]
    pub fn role_id(&self) -> Uuid {
        self.role_id
    }

    #[must_use]
    pub fn pairs(&self) -> Vec<RolePermission> {
        self.permission_ids
            .iter()
            .map(|permission_id| RolePermission {
                role_id: self.role_id,
                permission_id: *permission_id,
            })
            .collect()
    }
}
