//! Persistence contracts consumed by the use-cases.
//!
//! Implementations map their backend failures to [`Error::Storage`]. The
//! use-cases are plain futures: dropping one cancels at the next store await,
//! so multi-write sequences (signup, verification) should be wrapped in a
//! transaction by implementations that need atomicity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;
use crate::model::{Permission, Role, RoleGrant, User};
use crate::otp::{Otp, OtpPurpose};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, Error>;

    /// Look up by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Look up by normalized email or exact username, with no status
    /// pre-filtering.
    async fn find_by_credentials(&self, identifier: &str) -> Result<Option<User>, Error>;

    async fn email_exists(&self, email: &str) -> Result<bool, Error>;
    async fn username_exists(&self, username: &str) -> Result<bool, Error>;

    async fn add(&self, user: &User) -> Result<(), Error>;
    async fn update(&self, user: &User) -> Result<(), Error>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, Error>;

    /// # Errors
    ///
    /// [`Error::RoleExists`] when the name is already taken.
    async fn add_role(&self, role: &Role) -> Result<(), Error>;

    async fn find_permission(&self, resource: &str, action: &str)
        -> Result<Option<Permission>, Error>;
    async fn add_permission(&self, permission: &Permission) -> Result<(), Error>;

    async fn has_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, Error>;
    async fn has_grant(&self, role_id: Uuid, permission_id: Uuid) -> Result<bool, Error>;

    /// # Errors
    ///
    /// [`Error::RoleAlreadyAssigned`] for a duplicate `(user, role)` pair.
    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), Error>;

    /// # Errors
    ///
    /// [`Error::PermissionAlreadyGranted`] for a duplicate
    /// `(role, permission)` pair.
    async fn grant_permission(&self, role_id: Uuid, permission_id: Uuid) -> Result<(), Error>;

    /// A user's roles, each loaded with its permissions.
    async fn grants_for(&self, user_id: Uuid) -> Result<Vec<RoleGrant>, Error>;
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn add(&self, otp: &Otp) -> Result<(), Error>;
    async fn update(&self, otp: &Otp) -> Result<(), Error>;

    /// The most recently issued unused code for `(user, purpose)`, if any.
    async fn find_latest(&self, user_id: Uuid, purpose: OtpPurpose)
        -> Result<Option<Otp>, Error>;

    /// Mark every unused code for `(user, purpose)` as used.
    async fn invalidate_all(
        &self,
        user_id: Uuid,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> Result<(), Error>;

    /// Drop expired unused codes; returns how many were removed.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, Error>;
}
