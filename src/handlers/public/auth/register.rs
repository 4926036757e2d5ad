// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::extract::Extension;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::FieldErrors;
use crate::handlers::utils::{reject_missing, required};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, Db};
use crate::services::{AccountService, RegisterInput};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// POST /api/auth/register - Create an account
///
/// Responds 201 with a message only; the client logs in separately.
pub async fn register_post(
    Extension(Db(pool)): Extension<Db>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<Value> {
    let mut errors = FieldErrors::new();
    let input = RegisterInput {
        username: required(payload.username, "username", &mut errors),
        password: required(payload.password, "password", &mut errors),
        email: payload.email.unwrap_or_default(),
    };
    reject_missing(errors)?;

    AccountService::new(pool).register(&input).await?;

    Ok(ApiResponse::created(json!({ "message": "User registered successfully" })))
}
