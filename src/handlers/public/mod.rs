// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and account creation. Every input is untrusted.
pub mod auth;

pub use auth::*;
