//! Crate-wide error taxonomy.
//!
//! Every fallible operation returns a typed error. The embedding boundary
//! maps [`ErrorKind`] to an HTTP status deterministically, without inspecting
//! messages.

use thiserror::Error;

use crate::token;

#[derive(Debug, Error)]
pub enum Error {
    #[error("user not found")]
    UserNotFound,
    #[error("role not found: {0}")]
    RoleNotFound(String),
    #[error("permission not found: {0}")]
    PermissionNotFound(String),
    #[error("no verification code on record")]
    OtpNotFound,

    #[error("invalid email address")]
    InvalidEmail,
    #[error("invalid username")]
    InvalidUsername,
    #[error("invalid role name")]
    InvalidRoleName,
    #[error("password does not meet the minimum length")]
    WeakPassword,
    #[error("wrong password")]
    WrongPassword,
    #[error("wrong verification code")]
    WrongOtpCode,

    #[error("email already registered")]
    EmailTaken,
    #[error("username already taken")]
    UsernameTaken,
    #[error("role already exists: {0}")]
    RoleExists(String),
    #[error("role name is reserved: {0}")]
    ReservedRole(String),
    #[error("role already assigned")]
    RoleAlreadyAssigned,
    #[error("permission already granted")]
    PermissionAlreadyGranted,
    #[error("account already verified")]
    AlreadyVerified,

    #[error("admin privileges required")]
    AdminRequired,
    #[error("verification code expired")]
    OtpExpired,
    #[error(transparent)]
    Token(#[from] token::Error),

    #[error("account is inactive")]
    AccountInactive,
    #[error("account is not verified")]
    AccountUnverified,
    #[error("too many verification attempts")]
    MaxOtpAttempts,

    #[error("token secret is not configured")]
    MissingSecret,
    #[error("failed to hash credential")]
    Hash,
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Coarse classification used by the boundary to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Conflict,
    AuthenticationFailed,
    AuthorizationDenied,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::BadRequest => 400,
            Self::Conflict => 409,
            Self::AuthenticationFailed => 401,
            Self::AuthorizationDenied => 403,
            Self::Internal => 500,
        }
    }
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound
            | Self::RoleNotFound(_)
            | Self::PermissionNotFound(_)
            | Self::OtpNotFound => ErrorKind::NotFound,

            Self::InvalidEmail
            | Self::InvalidUsername
            | Self::InvalidRoleName
            | Self::WeakPassword
            | Self::WrongPassword
            | Self::WrongOtpCode => ErrorKind::BadRequest,

            Self::EmailTaken
            | Self::UsernameTaken
            | Self::RoleExists(_)
            | Self::ReservedRole(_)
            | Self::RoleAlreadyAssigned
            | Self::PermissionAlreadyGranted
            | Self::AlreadyVerified => ErrorKind::Conflict,

            Self::AdminRequired | Self::OtpExpired | Self::Token(_) => {
                ErrorKind::AuthenticationFailed
            }

            Self::AccountInactive | Self::AccountUnverified | Self::MaxOtpAttempts => {
                ErrorKind::AuthorizationDenied
            }

            Self::MissingSecret | Self::Hash | Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Wrap a backend failure from a store implementation.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_expected_status_codes() {
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::BadRequest.status_code(), 400);
        assert_eq!(ErrorKind::Conflict.status_code(), 409);
        assert_eq!(ErrorKind::AuthenticationFailed.status_code(), 401);
        assert_eq!(ErrorKind::AuthorizationDenied.status_code(), 403);
        assert_eq!(ErrorKind::Internal.status_code(), 500);
    }

    #[test]
    fn variants_classify_per_taxonomy() {
        assert_eq!(Error::UserNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(Error::WrongPassword.kind(), ErrorKind::BadRequest);
        assert_eq!(Error::AlreadyVerified.kind(), ErrorKind::Conflict);
        assert_eq!(Error::AdminRequired.kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(Error::OtpExpired.kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(Error::MaxOtpAttempts.kind(), ErrorKind::AuthorizationDenied);
        assert_eq!(Error::AccountInactive.kind(), ErrorKind::AuthorizationDenied);
        assert_eq!(Error::MissingSecret.kind(), ErrorKind::Internal);
    }

    #[test]
    fn storage_wraps_display() {
        let err = Error::storage("connection reset");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "storage failure: connection reset");
    }
}
