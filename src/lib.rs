//! # Warden (authentication & authorization core)
//!
//! `warden` is the decision core of a user-facing API: it verifies
//! credentials, issues and validates signed access tokens, and answers
//! per-endpoint authorization questions. HTTP routing and persistence are
//! collaborators, reached through the store traits in [`auth`].
//!
//! ## Accounts & Roles
//!
//! Accounts come from local signup (email + password, unverified until an
//! emailed one-time code is confirmed) or from an external identity provider
//! (pre-verified). Access is role-based: roles own permissions
//! (`resource:action` pairs), users hold roles through explicit join
//! records, and `Admin`/`SuperAdmin` are system-reserved.
//!
//! - **Claims are a snapshot.** A token embeds the subject's roles,
//!   flattened permissions, and status flags as of issuance; later changes
//!   are invisible until a new token is minted.
//! - **Errors are typed.** Every failure carries an [`error::ErrorKind`]
//!   that maps deterministically to an HTTP status at the boundary.
//! - **Fail-fast configuration.** The signing secret is loaded once at
//!   startup; a missing secret is a construction error, never a default.
//!
//! ## Policies
//!
//! [`policy::Policy`] is a pure predicate over the decoded claim set —
//! account-status checks (`verified`/`active`/`logged_in`) and role
//! membership checks (`RequireAdminOnly`, `RequireSuperAdminOnly`) — invoked
//! by the framework's authorization middleware.

pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod otp;
pub mod password;
pub mod policy;
pub mod seed;
pub mod token;

pub use auth::AuthService;
pub use config::TokenConfig;
pub use error::{Error, ErrorKind};
pub use policy::{ClaimSet, Policy};
