//! Authentication use-cases.
//!
//! Each flow is a strictly sequential, fail-fast pipeline over the store
//! contracts; the first violated invariant aborts the flow with a typed
//! error and nothing is retried here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::error::Error;
use crate::model::{flatten_permissions, has_admin_role, Role, RoleGrant, User, ROLE_VISITOR};
use crate::otp::{Otp, OtpPurpose};
use crate::password;
use crate::policy::ClaimSet;
use crate::token::{self, IssuedToken};

use super::store::{OtpStore, RoleStore, UserStore};
use super::validate::{normalize_email, valid_email, valid_password, valid_username};

#[derive(Debug, Clone)]
pub struct AdminLogin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Login {
    /// Email or username.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct VerifyEmail {
    pub email: String,
    pub code: String,
}

/// A logged-in user and their freshly issued token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: IssuedToken,
}

/// A new account, its token, and the pending verification code.
///
/// The account is usable immediately; `verification` is handed to the
/// out-of-band delivery collaborator and must be confirmed before the first
/// login.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub token: IssuedToken,
    pub verification: Otp,
    pub verification_required: bool,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    otps: Arc<dyn OtpStore>,
    token: TokenConfig,
}

impl AuthService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        otps: Arc<dyn OtpStore>,
        token: TokenConfig,
    ) -> Self {
        Self {
            users,
            roles,
            otps,
            token,
        }
    }

    /// Log an administrator in by email and password.
    ///
    /// # Errors
    ///
    /// [`Error::UserNotFound`], [`Error::WrongPassword`],
    /// [`Error::AdminRequired`] when the account holds neither `Admin` nor
    /// `SuperAdmin`, plus the [`User::record_login`] invariants.
    #[instrument(skip_all)]
    pub async fn admin_login(&self, input: AdminLogin) -> Result<Session, Error> {
        let email = normalize_email(&input.email);
        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(Error::UserNotFound)?;

        if !password::verify(&input.password, user.password_hash.as_deref().unwrap_or_default())
        {
            return Err(Error::WrongPassword);
        }

        let grants = self.roles.grants_for(user.id).await?;
        if !has_admin_role(&grants) {
            warn!(user = %user.id, "admin login without admin role");
            return Err(Error::AdminRequired);
        }

        let now = Utc::now();
        let token = self.issue_token(&user, &grants, now)?;
        user.record_login(now)?;
        self.users.update(&user).await?;

        debug!(user = %user.id, "admin login");
        Ok(Session { user, token })
    }

    /// Log a user in by email or username.
    ///
    /// The password is checked before account status, so a wrong password is
    /// reported identically for active and inactive accounts; not-found,
    /// bad-password, and inactive still map to distinct error kinds.
    ///
    /// # Errors
    ///
    /// [`Error::UserNotFound`], [`Error::WrongPassword`],
    /// [`Error::AccountInactive`], [`Error::AccountUnverified`].
    #[instrument(skip_all)]
    pub async fn login(&self, input: Login) -> Result<Session, Error> {
        let identifier = input.identifier.trim();
        let identifier = if identifier.contains('@') {
            normalize_email(identifier)
        } else {
            identifier.to_string()
        };
        let mut user = self
            .users
            .find_by_credentials(&identifier)
            .await?
            .ok_or(Error::UserNotFound)?;

        if !password::verify(&input.password, user.password_hash.as_deref().unwrap_or_default())
        {
            return Err(Error::WrongPassword);
        }
        if !user.is_active {
            return Err(Error::AccountInactive);
        }
        if user.requires_verification() {
            return Err(Error::AccountUnverified);
        }

        let grants = self.roles.grants_for(user.id).await?;
        let now = Utc::now();
        let token = self.issue_token(&user, &grants, now)?;
        user.record_login(now)?;
        self.users.update(&user).await?;

        debug!(user = %user.id, "login");
        Ok(Session { user, token })
    }

    /// Register a local account.
    ///
    /// The new user receives the default `Visitor` role and a token right
    /// away; email verification is deferred to [`Self::verify_email`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidEmail`] / [`Error::InvalidUsername`] /
    /// [`Error::WeakPassword`] for malformed input, [`Error::EmailTaken`] /
    /// [`Error::UsernameTaken`] for uniqueness violations,
    /// [`Error::RoleNotFound`] when the default role was never seeded.
    #[instrument(skip_all)]
    pub async fn sign_up(&self, input: SignUp) -> Result<Registration, Error> {
        let email = normalize_email(&input.email);
        if !valid_email(&email) {
            return Err(Error::InvalidEmail);
        }
        let username = input.username.trim().to_string();
        if !valid_username(&username) {
            return Err(Error::InvalidUsername);
        }
        if !valid_password(&input.password) {
            return Err(Error::WeakPassword);
        }

        let email_taken = self.users.email_exists(&email).await?;
        let username_taken = self.users.username_exists(&username).await?;
        if email_taken {
            return Err(Error::EmailTaken);
        }
        if username_taken {
            return Err(Error::UsernameTaken);
        }

        let password_hash = password::hash(&input.password)?;
        let now = Utc::now();
        let user = User::sign_up_local(email, username, password_hash, now)?;
        self.users.add(&user).await?;

        let visitor = self
            .roles
            .find_role_by_name(ROLE_VISITOR)
            .await?
            .ok_or_else(|| Error::RoleNotFound(ROLE_VISITOR.to_string()))?;
        self.roles.assign_role(user.id, visitor.id).await?;

        let grants = self.roles.grants_for(user.id).await?;
        let token = self.issue_token(&user, &grants, now)?;
        let verification = self.issue_verification(user.id, now).await?;

        debug!(user = %user.id, "signed up");
        Ok(Registration {
            user,
            token,
            verification,
            verification_required: true,
        })
    }

    /// Confirm an account with an emailed one-time code.
    ///
    /// # Errors
    ///
    /// [`Error::UserNotFound`], [`Error::AlreadyVerified`] (checked before
    /// the code store is consulted), [`Error::OtpNotFound`], and the
    /// [`Otp::check`] classification.
    #[instrument(skip_all)]
    pub async fn verify_email(&self, input: VerifyEmail) -> Result<(), Error> {
        let email = normalize_email(&input.email);
        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(Error::UserNotFound)?;
        if user.is_verified {
            return Err(Error::AlreadyVerified);
        }

        let mut otp = self
            .otps
            .find_latest(user.id, OtpPurpose::EmailVerification)
            .await?
            .ok_or(Error::OtpNotFound)?;

        let now = Utc::now();
        if let Err(err) = otp.check(&input.code, now) {
            if matches!(err, Error::WrongOtpCode) {
                // keep the attempt count
                self.otps.update(&otp).await?;
            }
            return Err(err);
        }

        otp.mark_used(now);
        self.otps.update(&otp).await?;
        user.mark_verified()?;
        self.otps
            .invalidate_all(user.id, OtpPurpose::EmailVerification, now)
            .await?;
        self.users.update(&user).await?;

        debug!(user = %user.id, "email verified");
        Ok(())
    }

    /// Issue a fresh verification code, superseding any outstanding one.
    ///
    /// # Errors
    ///
    /// [`Error::UserNotFound`], [`Error::AlreadyVerified`].
    #[instrument(skip_all)]
    pub async fn request_verification(&self, email: &str) -> Result<Otp, Error> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(Error::UserNotFound)?;
        if user.is_verified {
            return Err(Error::AlreadyVerified);
        }
        self.issue_verification(user.id, Utc::now()).await
    }

    /// # Errors
    ///
    /// [`Error::UserNotFound`].
    #[instrument(skip_all)]
    pub async fn logout(&self, user_id: Uuid) -> Result<(), Error> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(Error::UserNotFound)?;
        user.record_logout();
        self.users.update(&user).await
    }

    /// Decode and validate an inbound bearer token; the authentication hook
    /// for the framework middleware.
    ///
    /// # Errors
    ///
    /// [`Error::Token`] for any signature, claim, or lifetime failure.
    pub fn authenticate(&self, token: &str) -> Result<ClaimSet, Error> {
        let claims = token::decode(&self.token, token, Utc::now().timestamp())?;
        Ok(ClaimSet::from_claims(&claims)?)
    }

    /// Create a user-defined role. Gate behind `RequireSuperAdminOnly` at the
    /// boundary.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRoleName`], [`Error::ReservedRole`],
    /// [`Error::RoleExists`].
    #[instrument(skip_all, fields(role = %name))]
    pub async fn create_role(&self, name: &str, description: &str) -> Result<Role, Error> {
        let role = Role::new(name, description)?;
        self.roles.add_role(&role).await?;
        Ok(role)
    }

    /// Assign a role to a user by role name.
    ///
    /// # Errors
    ///
    /// [`Error::UserNotFound`], [`Error::RoleNotFound`],
    /// [`Error::RoleAlreadyAssigned`].
    #[instrument(skip_all, fields(role = %role_name))]
    pub async fn assign_role(&self, user_id: Uuid, role_name: &str) -> Result<(), Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(Error::UserNotFound)?;
        let role = self
            .roles
            .find_role_by_name(role_name)
            .await?
            .ok_or_else(|| Error::RoleNotFound(role_name.to_string()))?;
        self.roles.assign_role(user.id, role.id).await
    }

    /// Grant a permission to a role, both addressed by natural key.
    ///
    /// # Errors
    ///
    /// [`Error::RoleNotFound`], [`Error::PermissionNotFound`],
    /// [`Error::PermissionAlreadyGranted`].
    #[instrument(skip_all, fields(role = %role_name, resource = %resource, action = %action))]
    pub async fn grant_permission(
        &self,
        role_name: &str,
        resource: &str,
        action: &str,
    ) -> Result<(), Error> {
        let role = self
            .roles
            .find_role_by_name(role_name)
            .await?
            .ok_or_else(|| Error::RoleNotFound(role_name.to_string()))?;
        let permission = self
            .roles
            .find_permission(resource, action)
            .await?
            .ok_or_else(|| Error::PermissionNotFound(format!("{resource}:{action}")))?;
        self.roles.grant_permission(role.id, permission.id).await
    }

    fn issue_token(
        &self,
        user: &User,
        grants: &[RoleGrant],
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, Error> {
        let roles: Vec<String> = grants.iter().map(|grant| grant.role.name.clone()).collect();
        let permissions = flatten_permissions(grants);
        Ok(token::issue(
            &self.token,
            user,
            &roles,
            &permissions,
            now.timestamp(),
        )?)
    }

    async fn issue_verification(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Otp, Error> {
        self.otps
            .invalidate_all(user_id, OtpPurpose::EmailVerification, now)
            .await?;
        let otp = Otp::issue(user_id, OtpPurpose::EmailVerification, now);
        self.otps.add(&otp).await?;
        Ok(otp)
    }
}
