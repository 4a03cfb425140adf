// handlers/protected/form/response_post.rs - POST /api/form/:id/responses handler

use axum::Extension;

use crate::api::form::{CreateResponseRequest, ResponseDetails};
use crate::handlers::store;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::ResponseService;

/// POST /api/form/:id/responses - Record one submission against a form
///
/// ```json
/// {
///   "site": "Site 7",
///   "answers": [
///     { "formFieldId": 12, "value": "All clear" },
///     { "formFieldId": 13, "formFieldOptionId": 40 }
///   ]
/// }
/// ```
///
/// 404 when the form does not exist; 400 when an answer names a field of
/// another form or an option of another field. The submitter is taken from
/// the token. Answers and the response row are written in one transaction.
pub async fn response_post(
    Extension(user): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<i32>,
    ApiJson(payload): ApiJson<CreateResponseRequest>,
) -> ApiResult<ResponseDetails> {
    let service = ResponseService::new(store().await?);
    let saved = service.submit(form_id, user.user_id, payload).await?;
    Ok(ApiResponse::created(saved))
}
