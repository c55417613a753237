//! Users, roles, permissions, and their associations.
//!
//! Associations are explicit join records addressed by id pairs; traversal
//! goes through store queries, never bidirectional object graphs.

mod permission;
mod role;
mod user;

pub use permission::{Permission, PermissionGrants, RolePermission};
pub use role::{
    is_admin_role, Role, RoleAssignments, UserRole, MAX_ROLE_NAME_LEN, ROLE_ADMIN, ROLE_SUPER_ADMIN,
    ROLE_VISITOR,
};
pub use user::{AuthProvider, ExternalProvider, User, MAX_USERNAME_LEN};

use std::collections::BTreeSet;

/// One of a user's roles, loaded together with its permissions.
#[derive(Debug, Clone)]
pub struct RoleGrant {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// Union the permissions across a user's roles.
///
/// De-duplicated by `(resource, action)` identity and sorted, so the claim
/// list is stable regardless of role ordering.
#[must_use]
pub fn flatten_permissions(grants: &[RoleGrant]) -> Vec<String> {
    let keys: BTreeSet<String> = grants
        .iter()
        .flat_map(|grant| grant.permissions.iter().map(Permission::key))
        .collect();
    keys.into_iter().collect()
}

/// Whether any of the user's roles grants administrative access.
#[must_use]
pub fn has_admin_role(grants: &[RoleGrant]) -> bool {
    grants.iter().any(|grant| is_admin_role(&grant.role.name))
}
