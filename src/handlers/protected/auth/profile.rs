use axum::extract::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser, Db};
use crate::services::AccountService;

/// GET /api/auth/profile - The caller's `{id, username, email}`
pub async fn profile_get(
    Extension(Db(pool)): Extension<Db>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Value> {
    let user = AccountService::new(pool).profile(&auth_user).await?;

    Ok(ApiResponse::success(json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
    })))
}
