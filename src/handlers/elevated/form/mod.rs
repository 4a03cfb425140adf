// handlers/elevated/form/mod.rs - Form catalog administration

pub mod categories;  // GET /api/form/categories, POST /api/form/create-category
pub mod field_types; // GET /api/form/form-field-types
pub mod forms;       // GET/POST /api/form/forms
pub mod responses;   // GET /api/form/:id/responses

pub use categories::{category_create, category_list};
pub use field_types::field_type_list;
pub use forms::{form_create, form_list};
pub use responses::response_list;
