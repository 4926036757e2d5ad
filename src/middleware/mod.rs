pub mod auth;
pub mod json;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use json::ApiJson;
pub use response::{ApiResponse, ApiResult};

/// Connection pool handed to handlers through an `Extension` layer
#[derive(Clone, Debug)]
pub struct Db(pub sqlx::PgPool);
