use axum::extract::{Extension, Path};

use crate::database::models::Employee;
use crate::error::FieldErrors;
use crate::handlers::utils::{parse_id, reject_missing, required};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser, Db};
use crate::services::SubmissionService;

use super::EmployeeRequest;

/// GET /api/employees/:id
pub async fn get(
    Path(id): Path<String>,
    Extension(Db(pool)): Extension<Db>,
    Extension(_auth_user): Extension<AuthUser>,
) -> ApiResult<Employee> {
    let employee = SubmissionService::new(pool).get_submission(parse_id(&id)?).await?;
    Ok(ApiResponse::success(employee))
}

/// PUT /api/employees/:id - Both `form` and `data` required
pub async fn put(
    Path(id): Path<String>,
    Extension(Db(pool)): Extension<Db>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<EmployeeRequest>,
) -> ApiResult<Employee> {
    let id = parse_id(&id)?;

    let mut errors = FieldErrors::new();
    let form = required(payload.form, "form", &mut errors);
    let data = required(payload.data, "data", &mut errors);
    reject_missing(errors)?;

    let employee = SubmissionService::new(pool)
        .update_submission(&auth_user, id, Some(form), Some(data))
        .await?;
    Ok(ApiResponse::success(employee))
}

/// PATCH /api/employees/:id
pub async fn patch(
    Path(id): Path<String>,
    Extension(Db(pool)): Extension<Db>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<EmployeeRequest>,
) -> ApiResult<Employee> {
    let id = parse_id(&id)?;

    let employee = SubmissionService::new(pool)
        .update_submission(&auth_user, id, payload.form, payload.data)
        .await?;
    Ok(ApiResponse::success(employee))
}

/// DELETE /api/employees/:id
pub async fn delete(
    Path(id): Path<String>,
    Extension(Db(pool)): Extension<Db>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<()> {
    SubmissionService::new(pool).delete_submission(&auth_user, parse_id(&id)?).await?;
    Ok(ApiResponse::no_content())
}
