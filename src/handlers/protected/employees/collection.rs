use axum::extract::{Extension, Query};
use std::collections::HashMap;

use crate::config;
use crate::database::models::Employee;
use crate::error::FieldErrors;
use crate::filter::{Page, SubmissionQuery};
use crate::handlers::utils::{reject_missing, required};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser, Db};
use crate::services::SubmissionService;

use super::EmployeeRequest;

/// GET /api/employees - Paginated submissions in insertion order
///
/// Query parameters: `search`, `form`, `created_after`, `created_before`,
/// `data.<key>`, `page`, `page_size`.
pub async fn get(
    Query(params): Query<HashMap<String, String>>,
    Extension(Db(pool)): Extension<Db>,
    Extension(_auth_user): Extension<AuthUser>,
) -> ApiResult<Page<Employee>> {
    let api = &config::config().api;
    let query = SubmissionQuery::from_params(&params, api.default_page_size, api.max_page_size)?;

    let page = SubmissionService::new(pool).list_submissions(&query).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/employees - Store a JSON payload against a form
pub async fn post(
    Extension(Db(pool)): Extension<Db>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<EmployeeRequest>,
) -> ApiResult<Employee> {
    let mut errors = FieldErrors::new();
    let form = required(payload.form, "form", &mut errors);
    let data = required(payload.data, "data", &mut errors);
    reject_missing(errors)?;

    let employee = SubmissionService::new(pool)
        .create_submission(&auth_user, form, data)
        .await?;
    Ok(ApiResponse::created(employee))
}
