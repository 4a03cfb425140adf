// handlers/protected/auth/me.rs - GET /api/auth/me handler

use axum::Extension;

use crate::api::auth::MeResponse;
use crate::handlers::store;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::AuthService;

/// GET /api/auth/me - Profile and roles of the token's user, read fresh
/// from the directory (404 if the account no longer exists)
pub async fn me_get(Extension(user): Extension<AuthUser>) -> ApiResult<MeResponse> {
    let service = AuthService::from_config(store().await?);
    Ok(ApiResponse::success(service.me(user.user_id).await?))
}
