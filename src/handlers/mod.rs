// handlers/mod.rs - Handlers grouped by security tier
//
// Public (no token) → Protected (access token required)
pub mod protected; // /api/auth/profile, /api/auth/change-password, /api/forms, /api/employees
pub mod public;    // /api/auth/register, /api/auth/login, /api/auth/token/refresh
pub mod utils;
