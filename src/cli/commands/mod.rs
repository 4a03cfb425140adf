pub mod auth;
pub mod form;
pub mod server;
pub mod user;
