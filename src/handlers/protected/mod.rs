// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here runs behind `jwt_auth_middleware`, which places an
// `AuthUser` in the request extensions.

pub mod auth; // GET /api/auth/me
pub mod form; // form read-back and response submission
