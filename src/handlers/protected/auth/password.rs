use axum::extract::Extension;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::utils::REQUIRED;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser, Db};
use crate::services::AccountService;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// POST /api/auth/change-password
///
/// A missing or wrong `old_password` is a 400 "Old password is incorrect".
/// Existing tokens are not revoked.
pub async fn change_password_post(
    Extension(Db(pool)): Extension<Db>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Value> {
    let new_password = payload
        .new_password
        .ok_or_else(|| ApiError::field_error("new_password", REQUIRED))?;
    let old_password = payload.old_password.unwrap_or_default();

    AccountService::new(pool)
        .change_password(&auth_user, &old_password, &new_password)
        .await?;

    Ok(ApiResponse::success(json!({ "message": "Password changed successfully" })))
}
