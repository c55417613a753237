//! In-memory store used by the test suite and local bootstrapping.
//!
//! One mutex over the whole state; concurrent writers are last-writer-wins,
//! with no transactionality across calls.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::Error;
use crate::model::{
    Permission, PermissionGrants, Role, RoleAssignments, RoleGrant, RolePermission, User, UserRole,
};
use crate::otp::{Otp, OtpPurpose};

use super::store::{OtpStore, RoleStore, UserStore};

#[derive(Default)]
struct StoreState {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
    permissions: HashMap<Uuid, Permission>,
    user_roles: Vec<UserRole>,
    role_permissions: Vec<RolePermission>,
    otps: Vec<Otp>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, Error> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|user| user.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_by_credentials(&self, identifier: &str) -> Result<Option<User>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|user| {
                user.email.as_deref() == Some(identifier) || user.username == identifier
            })
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, Error> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, Error> {
        let state = self.state.lock().await;
        Ok(state.users.values().any(|user| user.username == username))
    }

    async fn add(&self, user: &User) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&user.id) {
            return Err(Error::UserNotFound);
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl RoleStore for InMemoryStore {
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .roles
            .values()
            .find(|role| role.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn add_role(&self, role: &Role) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        if state
            .roles
            .values()
            .any(|existing| existing.name.eq_ignore_ascii_case(&role.name))
        {
            return Err(Error::RoleExists(role.name.clone()));
        }
        state.roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn find_permission(
        &self,
        resource: &str,
        action: &str,
    ) -> Result<Option<Permission>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .permissions
            .values()
            .find(|permission| permission.matches(resource, action))
            .cloned())
    }

    async fn add_permission(&self, permission: &Permission) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        if state
            .permissions
            .values()
            .any(|existing| existing.matches(&permission.resource, &permission.action))
        {
            return Err(Error::PermissionAlreadyGranted);
        }
        state.permissions.insert(permission.id, permission.clone());
        Ok(())
    }

    async fn has_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, Error> {
        let state = self.state.lock().await;
        Ok(RoleAssignments::from_pairs(user_id, &state.user_roles).has(role_id))
    }

    async fn has_grant(&self, role_id: Uuid, permission_id: Uuid) -> Result<bool, Error> {
        let state = self.state.lock().await;
        Ok(state
            .role_permissions
            .iter()
            .any(|pair| pair.role_id == role_id && pair.permission_id == permission_id))
    }

    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        let mut assignments = RoleAssignments::from_pairs(user_id, &state.user_roles);
        assignments.assign(role_id)?;
        state.user_roles.push(UserRole { user_id, role_id });
        Ok(())
    }

    async fn grant_permission(&self, role_id: Uuid, permission_id: Uuid) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        let mut grants = PermissionGrants::from_pairs(role_id, &state.role_permissions);
        grants.grant(permission_id)?;
        state.role_permissions.push(RolePermission {
            role_id,
            permission_id,
        });
        Ok(())
    }

    async fn grants_for(&self, user_id: Uuid) -> Result<Vec<RoleGrant>, Error> {
        let state = self.state.lock().await;
        let assignments = RoleAssignments::from_pairs(user_id, &state.user_roles);

        let mut grants = Vec::new();
        for role_id in assignments.role_ids() {
            let Some(role) = state.roles.get(role_id) else {
                continue;
            };
            let permissions = state
                .role_permissions
                .iter()
                .filter(|pair| pair.role_id == *role_id)
                .filter_map(|pair| state.permissions.get(&pair.permission_id))
                .cloned()
                .collect();
            grants.push(RoleGrant {
                role: role.clone(),
                permissions,
            });
        }
        Ok(grants)
    }
}

#[async_trait]
impl OtpStore for InMemoryStore {
    async fn add(&self, otp: &Otp) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.otps.push(otp.clone());
        Ok(())
    }

    async fn update(&self, otp: &Otp) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        match state.otps.iter_mut().find(|stored| stored.id == otp.id) {
            Some(stored) => {
                *stored = otp.clone();
                Ok(())
            }
            None => Err(Error::OtpNotFound),
        }
    }

    async fn find_latest(
        &self,
        user_id: Uuid,
        purpose: OtpPurpose,
    ) -> Result<Option<Otp>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .otps
            .iter()
            .rev()
            .find(|otp| otp.user_id == user_id && otp.purpose == purpose && !otp.is_used)
            .cloned())
    }

    async fn invalidate_all(
        &self,
        user_id: Uuid,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        for otp in state
            .otps
            .iter_mut()
            .filter(|otp| otp.user_id == user_id && otp.purpose == purpose && !otp.is_used)
        {
            otp.mark_used(now);
        }
        Ok(())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let mut state = self.state.lock().await;
        let before = state.otps.len();
        state.otps.retain(|otp| otp.is_used || now <= otp.expires_at);
        Ok((before - state.otps.len()) as u64)
    }
}
