// handlers/elevated/users/show.rs - GET /api/admin/users/:user_id handler

use uuid::Uuid;

use crate::api::admin::UserListItem;
use crate::handlers::store;
use crate::middleware::{ApiPath, ApiResponse, ApiResult};
use crate::services::UserService;

pub async fn user_show(ApiPath(user_id): ApiPath<Uuid>) -> ApiResult<UserListItem> {
    let service = UserService::from_config(store().await?);
    Ok(ApiResponse::success(service.get(user_id).await?))
}
