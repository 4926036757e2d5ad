// handlers/protected/mod.rs - Protected handlers (access token required)
//
// Routes here sit behind `jwt_auth_middleware`, which injects `AuthUser`.
// Service calls receive the caller explicitly.
pub mod auth;      // /api/auth/profile, /api/auth/change-password
pub mod employees; // /api/employees[/:id]
pub mod forms;     // /api/forms[/:id]
