use axum::extract::{Extension, Path};

use crate::database::models::DynamicForm;
use crate::error::FieldErrors;
use crate::handlers::utils::{parse_id, reject_missing, required};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser, Db};
use crate::services::FormService;

use super::FormRequest;

/// GET /api/forms/:id
pub async fn get(
    Path(id): Path<String>,
    Extension(Db(pool)): Extension<Db>,
    Extension(_auth_user): Extension<AuthUser>,
) -> ApiResult<DynamicForm> {
    let form = FormService::new(pool).get_form(parse_id(&id)?).await?;
    Ok(ApiResponse::success(form))
}

/// PUT /api/forms/:id - Replace name and the full field list
pub async fn put(
    Path(id): Path<String>,
    Extension(Db(pool)): Extension<Db>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<FormRequest>,
) -> ApiResult<DynamicForm> {
    let id = parse_id(&id)?;

    let mut errors = FieldErrors::new();
    let name = required(payload.name, "name", &mut errors);
    let fields = required(payload.fields, "fields", &mut errors);
    reject_missing(errors)?;

    let form = FormService::new(pool)
        .update_form(&auth_user, id, Some(name.as_str()), Some(fields.as_slice()))
        .await?;
    Ok(ApiResponse::success(form))
}

/// PATCH /api/forms/:id - Omitted `fields` leave the stored fields untouched
pub async fn patch(
    Path(id): Path<String>,
    Extension(Db(pool)): Extension<Db>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<FormRequest>,
) -> ApiResult<DynamicForm> {
    let id = parse_id(&id)?;

    let form = FormService::new(pool)
        .update_form(&auth_user, id, payload.name.as_deref(), payload.fields.as_deref())
        .await?;
    Ok(ApiResponse::success(form))
}

/// DELETE /api/forms/:id - Cascades to fields and submissions
pub async fn delete(
    Path(id): Path<String>,
    Extension(Db(pool)): Extension<Db>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<()> {
    FormService::new(pool).delete_form(&auth_user, parse_id(&id)?).await?;
    Ok(ApiResponse::no_content())
}
