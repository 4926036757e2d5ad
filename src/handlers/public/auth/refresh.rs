// handlers/public/auth/refresh.rs - POST /api/auth/token/refresh handler

use axum::extract::Extension;
use serde::Deserialize;

use crate::error::ApiError;
use crate::handlers::utils::REQUIRED;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, Db};
use crate::services::account_service::{AccessToken, AccountService};

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

/// POST /api/auth/token/refresh - New access token from a refresh token
pub async fn refresh_post(
    Extension(Db(pool)): Extension<Db>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> ApiResult<AccessToken> {
    let refresh = payload
        .refresh
        .ok_or_else(|| ApiError::field_error("refresh", REQUIRED))?;

    let access = AccountService::new(pool).refresh(&refresh).await?;
    Ok(ApiResponse::success(access))
}
