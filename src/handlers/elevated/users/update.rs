// handlers/elevated/users/update.rs - PUT /api/admin/users/:user_id handler

use axum::Extension;
use uuid::Uuid;

use crate::api::admin::{UpdateUserRequest, UserListItem};
use crate::handlers::store;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::UserService;

/// PUT /api/admin/users/:user_id - Update profile and optionally the role set
///
/// When `roles` is sent it replaces the current set. Unknown roles are
/// listed in a 400. Admins cannot drop their own admin role and the last
/// admin cannot be demoted.
pub async fn user_update(
    Extension(acting): Extension<AuthUser>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> ApiResult<UserListItem> {
    let service = UserService::from_config(store().await?);
    let updated = service.update(acting.user_id, user_id, payload).await?;
    Ok(ApiResponse::success(updated))
}
