pub mod admin;
pub mod auth;
pub mod extract;
pub mod response;

pub use admin::require_admin_middleware;
pub use auth::{jwt_auth_middleware, AuthUser};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use response::{ApiResponse, ApiResult};
