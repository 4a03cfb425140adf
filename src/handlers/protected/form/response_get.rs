// handlers/protected/form/response_get.rs - GET /api/form/responses/:response_id handler

use axum::Extension;
use uuid::Uuid;

use crate::api::form::ResponseDetails;
use crate::handlers::store;
use crate::middleware::{ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::ResponseService;

/// GET /api/form/responses/:response_id - Read back a submission (owner or admin)
pub async fn response_get(
    Extension(user): Extension<AuthUser>,
    ApiPath(response_id): ApiPath<Uuid>,
) -> ApiResult<ResponseDetails> {
    let service = ResponseService::new(store().await?);
    let details = service.get(response_id, user.user_id, user.is_admin()).await?;
    Ok(ApiResponse::success(details))
}
