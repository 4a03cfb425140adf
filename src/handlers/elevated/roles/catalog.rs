// handlers/elevated/roles/catalog.rs - GET/POST /api/auth/roles handlers

use crate::api::auth::CreateRoleRequest;
use crate::database::models::Role;
use crate::handlers::store;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::RoleService;

/// GET /api/auth/roles - Role names, alphabetical
pub async fn role_list() -> ApiResult<Vec<String>> {
    let service = RoleService::from_config(store().await?);
    Ok(ApiResponse::success(service.list_roles().await?))
}

/// POST /api/auth/roles - `{ "name": "Inspector" }`; blank 400, duplicate 409
pub async fn role_create(ApiJson(payload): ApiJson<CreateRoleRequest>) -> ApiResult<Role> {
    let service = RoleService::from_config(store().await?);
    Ok(ApiResponse::created(service.create_role(&payload.name).await?))
}
