pub mod admin_guard;
pub mod auth_service;
pub mod error;
pub mod form_service;
pub mod response_service;
pub mod role_service;
pub mod seed;
pub mod user_service;

pub use admin_guard::{AdminGuard, GuardViolation};
pub use auth_service::AuthService;
pub use error::{ServiceError, ServiceResult};
pub use form_service::FormService;
pub use response_service::ResponseService;
pub use role_service::RoleService;
pub use user_service::UserService;
