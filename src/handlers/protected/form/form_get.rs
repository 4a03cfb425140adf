// handlers/protected/form/form_get.rs - GET /api/form/:id handler

use crate::api::form::FormDetails;
use crate::handlers::store;
use crate::middleware::{ApiPath, ApiResponse, ApiResult};
use crate::services::FormService;

/// GET /api/form/:id - Full form tree: sections, fields and options ordered by id
pub async fn form_get(ApiPath(id): ApiPath<i32>) -> ApiResult<FormDetails> {
    let service = FormService::new(store().await?);
    Ok(ApiResponse::success(service.get_form(id).await?))
}
