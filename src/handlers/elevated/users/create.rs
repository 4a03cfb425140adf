// handlers/elevated/users/create.rs - POST /api/admin/users handler

use crate::api::admin::{CreateUserRequest, UserListItem};
use crate::handlers::store;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::UserService;

/// POST /api/admin/users - Create an account on someone's behalf
///
/// Field errors come back as 400 `VALIDATION_ERROR` with per-field
/// `details`; password policy failures as 400 `IDENTITY_ERROR`; a taken
/// email as 409.
pub async fn user_create(ApiJson(payload): ApiJson<CreateUserRequest>) -> ApiResult<UserListItem> {
    let service = UserService::from_config(store().await?);
    Ok(ApiResponse::created(service.create(payload).await?))
}
