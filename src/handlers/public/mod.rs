// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Entry points for token acquisition. Inputs are untrusted and failed
// attempts are logged by the auth service.

pub mod auth;
