// handlers/elevated/roles/membership.rs - user role membership handlers

use axum::Extension;
use uuid::Uuid;

use crate::api::auth::{AddUserToRoleRequest, RoleChangeResponse};
use crate::handlers::store;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::RoleService;

/// GET /api/auth/users/:user_id/roles
pub async fn user_roles_get(ApiPath(user_id): ApiPath<Uuid>) -> ApiResult<Vec<String>> {
    let service = RoleService::from_config(store().await?);
    Ok(ApiResponse::success(service.roles_of(user_id).await?))
}

/// POST /api/auth/users/:user_id/roles - `{ "roleName": "Inspector" }`
///
/// Returns a fresh token for the target user carrying the new role.
pub async fn user_role_add(
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AddUserToRoleRequest>,
) -> ApiResult<RoleChangeResponse> {
    let service = RoleService::from_config(store().await?);
    Ok(ApiResponse::success(service.add_user_to_role(user_id, &payload.role_name).await?))
}

/// DELETE /api/auth/users/:user_id/roles/:role_name
///
/// Removing the admin role is subject to the same guard as user updates.
pub async fn user_role_remove(
    Extension(acting): Extension<AuthUser>,
    ApiPath((user_id, role_name)): ApiPath<(Uuid, String)>,
) -> ApiResult<RoleChangeResponse> {
    let service = RoleService::from_config(store().await?);
    let change = service.remove_user_from_role(acting.user_id, user_id, &role_name).await?;
    Ok(ApiResponse::success(change))
}
