// handlers/public/auth/login.rs - POST /api/auth/login handler

use crate::api::auth::{LoginRequest, TokenResponse};
use crate::handlers::store;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::AuthService;

/// POST /api/auth/login - Exchange email and password for a bearer token
///
/// ```json
/// { "email": "ana@example.com", "password": "Secret123" }
/// ```
///
/// Returns `{ "token": "...", "expiresAtUtc": "..." }`. Unknown email and
/// wrong password both answer 401 with the same message.
pub async fn login_post(ApiJson(payload): ApiJson<LoginRequest>) -> ApiResult<TokenResponse> {
    let service = AuthService::from_config(store().await?);
    let token = service.login(payload).await?;
    Ok(ApiResponse::success(token))
}
