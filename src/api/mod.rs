//! Request and response bodies, camelCase on the wire

pub mod admin;
pub mod auth;
pub mod form;
