// handlers/elevated/form/categories.rs - category handlers

use crate::api::form::CreateCategoryRequest;
use crate::database::models::CategorySummary;
use crate::handlers::store;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::FormService;

/// GET /api/form/categories - `{id, name, formsCount}` ordered by name
pub async fn category_list() -> ApiResult<Vec<CategorySummary>> {
    let service = FormService::new(store().await?);
    Ok(ApiResponse::success(service.list_categories().await?))
}

/// POST /api/form/create-category - blank 400, duplicate name (any case) 409
pub async fn category_create(ApiJson(payload): ApiJson<CreateCategoryRequest>) -> ApiResult<CategorySummary> {
    let service = FormService::new(store().await?);
    Ok(ApiResponse::created(service.create_category(&payload.name).await?))
}
