// handlers/protected/auth/mod.rs - Authenticated user's own account

pub mod me; // GET /api/auth/me

pub use me::me_get;
