// handlers/elevated/roles/mod.rs - Role catalog and membership

pub mod catalog;    // GET/POST /api/auth/roles
pub mod membership; // GET/POST /api/auth/users/:user_id/roles, DELETE .../:role_name

pub use catalog::{role_create, role_list};
pub use membership::{user_role_add, user_role_remove, user_roles_get};
