// handlers/elevated/form/forms.rs - GET/POST /api/form/forms handlers

use crate::api::form::{CreateFormRequest, FormDetails, FormListQuery};
use crate::database::models::FormSummary;
use crate::handlers::store;
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult};
use crate::services::FormService;
use crate::types::PagedResult;

/// GET /api/form/forms?page&pageSize&search&categoryId - Paged listing by name
pub async fn form_list(ApiQuery(query): ApiQuery<FormListQuery>) -> ApiResult<PagedResult<FormSummary>> {
    let service = FormService::new(store().await?);
    Ok(ApiResponse::success(service.list_forms(query).await?))
}

/// POST /api/form/forms - Create a form with its sections, fields and options
///
/// ```json
/// {
///   "name": "Site inspection",
///   "categoryId": 1,
///   "sections": [
///     {
///       "name": "General",
///       "fields": [
///         { "name": "Inspector", "formFieldTypeId": 1 },
///         { "name": "Weather", "formFieldTypeId": 5, "formFieldOptions": ["Sunny", "Rain"] }
///       ]
///     }
///   ]
/// }
/// ```
///
/// Checked before anything is written: non-blank name, at least one
/// section, at least one field, and that the category and every field type
/// exist. Unknown ids are reported together in `details.missingCategoryId`
/// and `details.missingTypeIds`. The tree is inserted in one transaction,
/// retried on transient database faults.
pub async fn form_create(ApiJson(payload): ApiJson<CreateFormRequest>) -> ApiResult<FormDetails> {
    let service = FormService::new(store().await?);
    Ok(ApiResponse::created(service.create_form(payload).await?))
}
