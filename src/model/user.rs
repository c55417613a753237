//! User accounts and their status lifecycle.
//!
//! # Invariants
//! - Local accounts require an email and a password hash.
//! - Usernames are bounded in length; uniqueness is enforced by the store.
//! - Accounts are never hard-deleted; status flags flip instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

pub const MAX_USERNAME_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    Local,
    Google,
    Facebook,
}

impl AuthProvider {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Google => "google",
            Self::Facebook => "facebook",
        }
    }
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity providers that carry their own verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalProvider {
    Google,
    Facebook,
}

impl From<ExternalProvider> for AuthProvider {
    fn from(provider: ExternalProvider) -> Self {
        match provider {
            ExternalProvider::Google => Self::Google,
            ExternalProvider::Facebook => Self::Facebook,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub username: String,
    pub password_hash: Option<String>,
    pub provider: AuthProvider,
    pub is_verified: bool,
    pub is_active: bool,
    pub is_logged_in: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a local account from a signup. Starts unverified and active.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidEmail`] for an empty email, [`Error::InvalidUsername`]
    /// for an empty or overlong username, [`Error::Hash`] for an empty
    /// password hash.
    pub fn sign_up_local(
        email: String,
        username: String,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        if email.is_empty() {
            return Err(Error::InvalidEmail);
        }
        if username.is_empty() || username.len() > MAX_USERNAME_LEN {
            return Err(Error::InvalidUsername);
        }
        if password_hash.is_empty() {
            return Err(Error::Hash);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            email: Some(email),
            username,
            password_hash: Some(password_hash),
            provider: AuthProvider::Local,
            is_verified: false,
            is_active: true,
            is_logged_in: false,
            last_login_at: None,
            created_at: now,
        })
    }

    /// Create an account from an external identity provider. Starts verified.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUsername`] for an empty or overlong username.
    pub fn sign_up_external(
        email: Option<String>,
        username: String,
        provider: ExternalProvider,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        if username.is_empty() || username.len() > MAX_USERNAME_LEN {
            return Err(Error::InvalidUsername);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            email,
            username,
            password_hash: None,
            provider: provider.into(),
            is_verified: true,
            is_active: true,
            is_logged_in: false,
            last_login_at: None,
            created_at: now,
        })
    }

    /// Whether this account still needs OTP verification before it can log in.
    #[must_use]
    pub fn requires_verification(&self) -> bool {
        self.provider == AuthProvider::Local && !self.is_verified
    }

    /// Record a successful login.
    ///
    /// # Errors
    ///
    /// [`Error::AccountInactive`] for a deactivated account,
    /// [`Error::AccountUnverified`] for an unverified local account.
    pub fn record_login(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        if !self.is_active {
            return Err(Error::AccountInactive);
        }
        if self.requires_verification() {
            return Err(Error::AccountUnverified);
        }
        self.is_logged_in = true;
        self.last_login_at = Some(now);
        Ok(())
    }

    pub fn record_logout(&mut self) {
        self.is_logged_in = false;
    }

    /// Flip the account to verified.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyVerified`] when the account was verified before.
    pub fn mark_verified(&mut self) -> Result<(), Error> {
        if self.is_verified {
            return Err(Error::AlreadyVerified);
        }
        self.is_verified = true;
        Ok(())
    }

    pub fn activate(&mut self) {
        self.is_active = true;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.is_logged_in = false;
    }
}
