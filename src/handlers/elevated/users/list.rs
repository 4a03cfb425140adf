// handlers/elevated/users/list.rs - GET /api/admin/users handler

use crate::api::admin::{UserListItem, UserListQuery};
use crate::handlers::store;
use crate::middleware::{ApiQuery, ApiResponse, ApiResult};
use crate::services::UserService;
use crate::types::PagedResult;

/// GET /api/admin/users?page&pageSize&search&role
///
/// `page < 1` is read as 1 and a page size outside 1..=200 as 20. `search`
/// matches email, names and izaro code ignoring case. An unknown `role`
/// yields an empty page; a known one filters the fetched page, so
/// `totalCount` still counts every search match.
pub async fn user_list(ApiQuery(query): ApiQuery<UserListQuery>) -> ApiResult<PagedResult<UserListItem>> {
    let service = UserService::from_config(store().await?);
    Ok(ApiResponse::success(service.list(query).await?))
}
