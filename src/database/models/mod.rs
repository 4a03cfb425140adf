pub mod form;
pub mod response;
pub mod user;

pub use form::*;
pub use response::*;
pub use user::*;
