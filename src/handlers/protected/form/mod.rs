// handlers/protected/form/mod.rs - Form access for any authenticated user

pub mod form_get;     // GET /api/form/:id
pub mod response_get; // GET /api/form/responses/:response_id
pub mod response_post; // POST /api/form/:id/responses

pub use form_get::form_get;
pub use response_get::response_get;
pub use response_post::response_post;
