// handlers/elevated/users/mod.rs - User directory administration

pub mod create; // POST /api/admin/users
pub mod list;   // GET /api/admin/users
pub mod show;   // GET /api/admin/users/:user_id
pub mod update; // PUT /api/admin/users/:user_id

pub use create::user_create;
pub use list::user_list;
pub use show::user_show;
pub use update::user_update;
