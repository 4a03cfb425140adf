// handlers/elevated/mod.rs - Admin-only handlers
//
// Routes here run behind `jwt_auth_middleware` and then
// `require_admin_middleware`; non-admin tokens get 403.

pub mod form;  // catalog management and response listing under /api/form
pub mod roles; // /api/auth/roles and /api/auth/users/:user_id/roles
pub mod users; // /api/admin/users
