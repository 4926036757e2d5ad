// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::Extension;
use serde::Deserialize;

use crate::auth::TokenPair;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, Db};
use crate::services::AccountService;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/login - Exchange credentials for `{refresh, access}`
///
/// Missing credentials, unknown users and wrong passwords all produce the
/// same 401 body.
pub async fn login_post(
    Extension(Db(pool)): Extension<Db>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<TokenPair> {
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let tokens = AccountService::new(pool).login(&username, &password).await?;
    Ok(ApiResponse::success(tokens))
}
