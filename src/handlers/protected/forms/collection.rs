use axum::extract::Extension;

use crate::database::models::DynamicForm;
use crate::error::FieldErrors;
use crate::handlers::utils::{reject_missing, required};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser, Db};
use crate::services::FormService;

use super::FormRequest;

/// GET /api/forms - Every form with nested fields in display order
pub async fn get(
    Extension(Db(pool)): Extension<Db>,
    Extension(_auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<DynamicForm>> {
    let forms = FormService::new(pool).list_forms().await?;
    Ok(ApiResponse::success(forms))
}

/// POST /api/forms - Create a form and its fields as one unit
///
/// Both `name` and `fields` are required; `fields` may be empty.
pub async fn post(
    Extension(Db(pool)): Extension<Db>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<FormRequest>,
) -> ApiResult<DynamicForm> {
    let mut errors = FieldErrors::new();
    let name = required(payload.name, "name", &mut errors);
    let fields = required(payload.fields, "fields", &mut errors);
    reject_missing(errors)?;

    let form = FormService::new(pool).create_form(&auth_user, &name, &fields).await?;
    Ok(ApiResponse::created(form))
}
