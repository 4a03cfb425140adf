use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

/// Admin tier gate; must run after `jwt_auth_middleware`
pub async fn require_admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.is_admin() {
        tracing::warn!("User {} denied admin route {}", user.user_id, request.uri().path());
        return Err(ApiError::forbidden("Admin role required"));
    }

    Ok(next.run(request).await)
}
