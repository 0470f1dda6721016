// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition endpoints. Inputs are untrusted and validated here.

pub mod auth;
