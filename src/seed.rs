//! Bootstrap roles, permissions, and the first SuperAdmin account.
//!
//! Safe to run on every startup: existing roles, permissions, grants, and
//! the SuperAdmin account are left untouched. Store implementations that
//! need atomicity wrap the whole routine in a transaction.

use chrono::Utc;
use tracing::{debug, info};

use crate::auth::{RoleStore, UserStore};
use crate::error::Error;
use crate::model::{Permission, Role, User, ROLE_ADMIN, ROLE_SUPER_ADMIN, ROLE_VISITOR};
use crate::password;

/// Baseline permission catalog: (resource, action, description).
const DEFAULT_PERMISSIONS: &[(&str, &str, &str)] = &[
    ("files", "read", "list and download files"),
    ("files", "write", "upload, replace, and delete files"),
    ("users", "read", "list users and view profiles"),
    ("users", "write", "manage user accounts"),
    ("roles", "manage", "create roles and grant permissions"),
];

/// Permissions granted to `Admin` (everything except role management).
const ADMIN_GRANTS: &[(&str, &str)] = &[
    ("files", "read"),
    ("files", "write"),
    ("users", "read"),
    ("users", "write"),
];

/// Permissions granted to `Visitor`.
const VISITOR_GRANTS: &[(&str, &str)] = &[("files", "read")];

/// Seed the role/permission directory and the SuperAdmin account.
///
/// # Errors
///
/// Propagates store failures and [`Error::Hash`] from password hashing;
/// never fails on state that is already seeded.
pub async fn seed_defaults(
    users: &dyn UserStore,
    roles: &dyn RoleStore,
    superadmin_email: &str,
    superadmin_password: &str,
) -> Result<(), Error> {
    for (resource, action, description) in DEFAULT_PERMISSIONS {
        if roles.find_permission(resource, action).await?.is_none() {
            roles
                .add_permission(&Permission::new(*resource, *action, *description))
                .await?;
        }
    }

    let super_admin = ensure_role(roles, ROLE_SUPER_ADMIN, "unrestricted access").await?;
    let admin = ensure_role(roles, ROLE_ADMIN, "administrative access").await?;
    let visitor = ensure_role(roles, ROLE_VISITOR, "default signup role").await?;

    for (resource, action, _) in DEFAULT_PERMISSIONS {
        ensure_grant(roles, &super_admin, resource, action).await?;
    }
    for (resource, action) in ADMIN_GRANTS {
        ensure_grant(roles, &admin, resource, action).await?;
    }
    for (resource, action) in VISITOR_GRANTS {
        ensure_grant(roles, &visitor, resource, action).await?;
    }

    let email = superadmin_email.trim().to_lowercase();
    if users.email_exists(&email).await? {
        debug!("superadmin already present, seeding skipped");
        return Ok(());
    }

    let now = Utc::now();
    let hash = password::hash(superadmin_password)?;
    let mut user = User::sign_up_local(email, "superadmin".to_string(), hash, now)?;
    user.mark_verified()?;
    users.add(&user).await?;
    roles.assign_role(user.id, super_admin.id).await?;

    info!(user = %user.id, "seeded superadmin account");
    Ok(())
}

async fn ensure_role(
    roles: &dyn RoleStore,
    name: &str,
    description: &str,
) -> Result<Role, Error> {
    if let Some(existing) = roles.find_role_by_name(name).await? {
        return Ok(existing);
    }
    let role = Role::builtin(name, description);
    roles.add_role(&role).await?;
    Ok(role)
}

async fn ensure_grant(
    roles: &dyn RoleStore,
    role: &Role,
    resource: &str,
    action: &str,
) -> Result<(), Error> {
    let permission = roles
        .find_permission(resource, action)
        .await?
        .ok_or_else(|| Error::PermissionNotFound(format!("{resource}:{action}")))?;
    if roles.has_grant(role.id, permission.id).await? {
        return Ok(());
    }
    roles.grant_permission(role.id, permission.id).await
}
