// handlers/public/auth/register.rs - POST /api/auth/register handler

use crate::api::auth::{RegisterRequest, TokenResponse};
use crate::handlers::store;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::AuthService;

/// POST /api/auth/register - Self-service account creation
///
/// 403 when registration is disabled, 409 for a taken email, 400 with
/// `errors[]` for identity rule failures. New accounts get the configured
/// default roles and a token straight away.
pub async fn register_post(ApiJson(payload): ApiJson<RegisterRequest>) -> ApiResult<TokenResponse> {
    let service = AuthService::from_config(store().await?);
    let token = service.register(payload).await?;
    Ok(ApiResponse::success(token))
}
