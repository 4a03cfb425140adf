// handlers/elevated/form/responses.rs - GET /api/form/:id/responses handler

use crate::api::form::PageQuery;
use crate::database::models::ResponseSummary;
use crate::handlers::store;
use crate::middleware::{ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::ResponseService;
use crate::types::PagedResult;

/// GET /api/form/:id/responses?page&pageSize - Newest submissions first
pub async fn response_list(
    ApiPath(form_id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<PagedResult<ResponseSummary>> {
    let service = ResponseService::new(store().await?);
    Ok(ApiResponse::success(service.list_for_form(form_id, query).await?))
}
