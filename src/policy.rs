//! Policy evaluation over decoded claim sets.
//!
//! A policy is a declarative predicate checked per protected endpoint by the
//! framework's authorization hook. Evaluation is pure: it cannot fail, it
//! only answers yes or no; an absent claim is a quiet no.

use std::collections::BTreeMap;

use crate::token::AccessClaims;

pub const STATUS_VERIFIED: &str = "verified";
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_LOGGED_IN: &str = "logged_in";

/// The typed, read-only snapshot decoded from an inbound token.
///
/// Reflects the subject's state at issuance time; role changes after
/// issuance are invisible until a new token is minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    pub subject: String,
    pub username: String,
    pub email: Option<String>,
    pub provider: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub status: BTreeMap<String, bool>,
}

impl ClaimSet {
    /// Materialize a claim set from verified token claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the aggregated permissions claim is not a JSON
    /// string array.
    pub fn from_claims(claims: &AccessClaims) -> Result<Self, crate::token::Error> {
        let permissions = claims.permission_list()?;
        let status = BTreeMap::from([
            (STATUS_VERIFIED.to_string(), claims.verified),
            (STATUS_ACTIVE.to_string(), claims.active),
            (STATUS_LOGGED_IN.to_string(), claims.logged_in),
        ]);
        Ok(Self {
            subject: claims.sub.clone(),
            username: claims.username.clone(),
            email: claims.email.clone(),
            provider: claims.provider.clone(),
            roles: claims.roles.clone(),
            permissions,
            status,
        })
    }

    #[must_use]
    pub fn has_permission(&self, key: &str) -> bool {
        self.permissions.iter().any(|p| p == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Succeeds iff the status claim exists and its rendered value equals
    /// `expected_value` case-insensitively.
    AccountStatus {
        claim_type: String,
        expected_value: String,
    },
    /// Succeeds iff any presented role matches any allowed role
    /// case-insensitively.
    RoleMembership { allowed_roles: Vec<String> },
}

impl Policy {
    #[must_use]
    pub fn require_verified_user() -> Self {
        Self::status(STATUS_VERIFIED)
    }

    #[must_use]
    pub fn require_active_user() -> Self {
        Self::status(STATUS_ACTIVE)
    }

    #[must_use]
    pub fn require_logged_in_user() -> Self {
        Self::status(STATUS_LOGGED_IN)
    }

    #[must_use]
    pub fn require_admin_only() -> Self {
        Self::RoleMembership {
            allowed_roles: vec![
                crate::model::ROLE_ADMIN.to_string(),
                crate::model::ROLE_SUPER_ADMIN.to_string(),
            ],
        }
    }

    #[must_use]
    pub fn require_super_admin_only() -> Self {
        Self::RoleMembership {
            allowed_roles: vec![crate::model::ROLE_SUPER_ADMIN.to_string()],
        }
    }

    fn status(claim_type: &str) -> Self {
        Self::AccountStatus {
            claim_type: claim_type.to_string(),
            expected_value: "true".to_string(),
        }
    }

    /// Evaluate against a claim set. Pure; never panics, never errors.
    #[must_use]
    pub fn evaluate(&self, claims: &ClaimSet) -> bool {
        match self {
            Self::AccountStatus {
                claim_type,
                expected_value,
            } => claims
                .status
                .get(claim_type)
                .map(|value| if *value { "true" } else { "false" })
                .is_some_and(|value| value.eq_ignore_ascii_case(expected_value)),
            Self::RoleMembership { allowed_roles } => allowed_roles.iter().any(|allowed| {
                claims
                    .roles
                    .iter()
                    .any(|role| role.eq_ignore_ascii_case(allowed))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(roles: &[&str], verified: bool) -> ClaimSet {
        ClaimSet {
            subject: "subject".to_string(),
            username: "alice".to_string(),
            email: None,
            provider: "local".to_string(),
            roles: roles.iter().map(ToString::to_string).collect(),
            permissions: vec!["files:read".to_string()],
            status: BTreeMap::from([
                (STATUS_VERIFIED.to_string(), verified),
                (STATUS_ACTIVE.to_string(), true),
                (STATUS_LOGGED_IN.to_string(), true),
            ]),
        }
    }

    #[test]
    fn role_policy_matches_case_insensitively() {
        let policy = Policy::require_admin_only();
        assert!(policy.evaluate(&claims(&["admin"], true)));
        assert!(policy.evaluate(&claims(&["SUPERADMIN"], true)));
        assert!(!policy.evaluate(&claims(&["Visitor"], true)));
    }

    #[test]
    fn role_policy_fails_quietly_without_role_claims() {
        let policy = Policy::require_admin_only();
        assert!(!policy.evaluate(&claims(&[], true)));
    }

    #[test]
    fn super_admin_policy_excludes_plain_admin() {
        let policy = Policy::require_super_admin_only();
        assert!(!policy.evaluate(&claims(&["Admin"], true)));
        assert!(policy.evaluate(&claims(&["superadmin"], true)));
    }

    #[test]
    fn status_policy_compares_value_case_insensitively() {
        let policy = Policy::AccountStatus {
            claim_type: STATUS_VERIFIED.to_string(),
            expected_value: "True".to_string(),
        };
        assert!(policy.evaluate(&claims(&[], true)));
        assert!(!policy.evaluate(&claims(&[], false)));
    }

    #[test]
    fn status_policy_fails_quietly_on_absent_claim() {
        let policy = Policy::AccountStatus {
            claim_type: "unknown".to_string(),
            expected_value: "true".to_string(),
        };
        assert!(!policy.evaluate(&claims(&[], true)));
    }

    #[test]
    fn builtin_status_policies() {
        let set = claims(&[], true);
        assert!(Policy::require_verified_user().evaluate(&set));
        assert!(Policy::require_active_user().evaluate(&set));
        assert!(Policy::require_logged_in_user().evaluate(&set));
        assert!(!Policy::require_verified_user().evaluate(&claims(&[], false)));
    }

    #[test]
    fn permission_lookup_is_exact() {
        let set = claims(&[], true);
        assert!(set.has_permission("files:read"));
        assert!(!set.has_permission("files:write"));
    }
}
