use tracing::{info, warn};
use uuid::Uuid;

use crate::api::auth::RoleChangeResponse;
use crate::auth::TokenIssuer;
use crate::database::models::{normalize_key, Role, User, UserUpdate};
use crate::database::repository::DirectoryStore;
use crate::services::admin_guard::{self, AdminGuard};
use crate::services::error::{ServiceError, ServiceResult};

/// Role catalog and single-role membership changes
pub struct RoleService<S> {
    store: S,
    guard: AdminGuard,
    tokens: TokenIssuer,
}

impl<S: DirectoryStore> RoleService<S> {
    pub fn new(store: S, guard: AdminGuard, tokens: TokenIssuer) -> Self {
        Self { store, guard, tokens }
    }

    pub fn from_config(store: S) -> Self {
        Self::new(store, AdminGuard::from_config(), TokenIssuer::from_config())
    }

    pub async fn list_roles(&self) -> ServiceResult<Vec<String>> {
        Ok(self.store.list_roles().await?.into_iter().map(|r| r.name).collect())
    }

    pub async fn create_role(&self, name: &str) -> ServiceResult<Role> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("Role name is required"));
        }
        if self.store.find_role(name).await?.is_some() {
            return Err(ServiceError::Conflict(format!("Role '{}' already exists", name)));
        }
        let role = self.store.insert_role(name).await?;
        info!("Created role '{}'", role.name);
        Ok(role)
    }

    pub async fn roles_of(&self, user_id: Uuid) -> ServiceResult<Vec<String>> {
        let user = self.require_user(user_id).await?;
        Ok(self.store.roles_of(user.id).await?)
    }

    /// Grant one role and return a token reflecting the new role set
    pub async fn add_user_to_role(&self, user_id: Uuid, role_name: &str) -> ServiceResult<RoleChangeResponse> {
        let user = self.require_user(user_id).await?;
        let role = self
            .store
            .find_role(role_name.trim())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Role '{}' does not exist", role_name.trim())))?;

        let current = self.store.roles_of(user.id).await?;
        if current.iter().any(|r| normalize_key(r) == normalize_key(&role.name)) {
            return Err(ServiceError::BadRequest(format!("User is already in role '{}'", role.name)));
        }

        self.store.add_roles(user.id, &[role.name.clone()]).await?;
        info!("Added user {} to role '{}'", user.id, role.name);

        self.fresh_token(&user, "Role assigned").await
    }

    /// Revoke one role; admin removal goes through the guard
    pub async fn remove_user_from_role(
        &self,
        acting_user: Uuid,
        user_id: Uuid,
        role_name: &str,
    ) -> ServiceResult<RoleChangeResponse> {
        let user = self.require_user(user_id).await?;
        let current = self.store.roles_of(user.id).await?;
        let role = current
            .iter()
            .find(|r| normalize_key(r) == normalize_key(role_name))
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("User is not in role '{}'", role_name)))?;

        if self.guard.is_admin_role(&role) {
            if let Err(violation) = self.guard.check_actor(acting_user, user.id) {
                warn!("Refused admin removal on {} by {}: {}", user.id, acting_user, violation);
                return Err(ServiceError::BadRequest(violation.to_string()));
            }
        }

        let update = self.guard.protect(UserUpdate {
            remove_roles: vec![role.clone()],
            ..UserUpdate::default()
        });
        let outcome = self.store.apply_user_update(user.id, &update).await?;
        if let Err(violation) = admin_guard::settle(outcome) {
            warn!("Refused admin removal on {} by {}: {}", user.id, acting_user, violation);
            return Err(ServiceError::BadRequest(violation.to_string()));
        }
        info!("Removed user {} from role '{}'", user.id, role);

        self.fresh_token(&user, "Role removed").await
    }

    async fn fresh_token(&self, user: &User, message: &str) -> ServiceResult<RoleChangeResponse> {
        let roles = self.store.roles_of(user.id).await?;
        let issued = self.tokens.issue(user, &roles)?;
        Ok(RoleChangeResponse::new(message, issued))
    }

    async fn require_user(&self, user_id: Uuid) -> ServiceResult<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }
}
