// handlers/elevated/form/field_types.rs - GET /api/form/form-field-types handler

use crate::database::models::FieldType;
use crate::handlers::store;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::FormService;

pub async fn field_type_list() -> ApiResult<Vec<FieldType>> {
    let service = FormService::new(store().await?);
    Ok(ApiResponse::success(service.list_field_types().await?))
}
