use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};

use crate::database::models::{Employee, FormRow};
use crate::database::{DatabaseError, Repository};
use crate::error::FieldErrors;
use crate::filter::{FilterError, Page, SubmissionQuery};
use crate::middleware::AuthUser;
use crate::services::form_service::NUL_MESSAGE;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Invalid submission: {0:?}")]
    Validation(FieldErrors),

    #[error("Submission {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for SubmissionError {
    fn from(err: sqlx::Error) -> Self {
        SubmissionError::Database(err.into())
    }
}

fn missing_form(form_id: i64) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", form_id)
}

fn check_data(data: &Value, errors: &mut FieldErrors) {
    if !data.is_object() {
        errors.insert("data".to_string(), "Expected a JSON object.".to_string());
    } else if contains_nul(data) {
        errors.insert("data".to_string(), NUL_MESSAGE.to_string());
    }
}

/// jsonb rejects U+0000 in keys and strings at any depth
fn contains_nul(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains('\0'),
        Value::Array(items) => items.iter().any(contains_nul),
        Value::Object(map) => map.iter().any(|(k, v)| k.contains('\0') || contains_nul(v)),
        _ => false,
    }
}

fn form_error(form_id: i64) -> SubmissionError {
    let mut errors = FieldErrors::new();
    errors.insert("form".to_string(), missing_form(form_id));
    SubmissionError::Validation(errors)
}

/// Stores JSON payloads against forms. Payload keys are not checked
/// against the form's fields.
pub struct SubmissionService {
    pool: PgPool,
}

impl SubmissionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn employees(&self) -> Repository<Employee> {
        Repository::new("employees", self.pool.clone())
    }

    async fn check_form(&self, form_id: i64, errors: &mut FieldErrors) -> Result<(), SubmissionError> {
        let forms: Repository<FormRow> = Repository::new("dynamic_forms", self.pool.clone());
        if !forms.exists(form_id).await? {
            errors.insert("form".to_string(), missing_form(form_id));
        }
        Ok(())
    }

    pub async fn create_submission(
        &self,
        caller: &AuthUser,
        form_id: i64,
        data: Value,
    ) -> Result<Employee, SubmissionError> {
        let mut errors = FieldErrors::new();
        check_data(&data, &mut errors);
        self.check_form(form_id, &mut errors).await?;
        if !errors.is_empty() {
            return Err(SubmissionError::Validation(errors));
        }

        let inserted = sqlx::query_as::<_, Employee>(
            "INSERT INTO employees (form_id, data) VALUES ($1, $2) RETURNING *",
        )
        .bind(form_id)
        .bind(&data)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from);

        match inserted {
            Ok(employee) => {
                info!(user_id = caller.user_id, form_id, employee_id = employee.id, "Created submission");
                Ok(employee)
            }
            // Form deleted between the check and the insert
            Err(e) if e.is_foreign_key_violation() => Err(form_error(form_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Filtered page in insertion order. Pages past the end are an error,
    /// except page 1 of an empty result.
    pub async fn list_submissions(&self, query: &SubmissionQuery) -> Result<Page<Employee>, SubmissionError> {
        let repo = self.employees();

        let count = repo.count(&query.to_filter()?).await?;
        let total_pages = query.total_pages(count);
        if query.page > total_pages {
            debug!(page = query.page, total_pages, "Requested page out of range");
            return Err(FilterError::InvalidPage("Invalid page.".to_string()).into());
        }

        let results = repo.select_any(&query.to_page_filter()?).await?;
        Ok(Page {
            count,
            page: query.page,
            total_pages,
            results,
        })
    }

    pub async fn get_submission(&self, id: i64) -> Result<Employee, SubmissionError> {
        self.employees()
            .select_one(id)
            .await?
            .ok_or(SubmissionError::NotFound(id))
    }

    /// Replaces `form` and/or `data`; omitted values keep their stored value
    pub async fn update_submission(
        &self,
        caller: &AuthUser,
        id: i64,
        form_id: Option<i64>,
        data: Option<Value>,
    ) -> Result<Employee, SubmissionError> {
        if !self.employees().exists(id).await? {
            return Err(SubmissionError::NotFound(id));
        }

        let mut errors = FieldErrors::new();
        if let Some(data) = &data {
            check_data(data, &mut errors);
        }
        if let Some(form_id) = form_id {
            self.check_form(form_id, &mut errors).await?;
        }
        if !errors.is_empty() {
            return Err(SubmissionError::Validation(errors));
        }

        let updated = sqlx::query_as::<_, Employee>(
            "UPDATE employees SET form_id = COALESCE($2, form_id), data = COALESCE($3, data) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(form_id)
        .bind(&data)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from);

        match updated {
            Ok(Some(employee)) => {
                info!(user_id = caller.user_id, employee_id = id, "Updated submission");
                Ok(employee)
            }
            Ok(None) => Err(SubmissionError::NotFound(id)),
            Err(e) if e.is_foreign_key_violation() => Err(form_error(form_id.unwrap_or_default())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_submission(&self, caller: &AuthUser, id: i64) -> Result<(), SubmissionError> {
        match self.employees().delete_404(id).await {
            Ok(()) => {
                info!(user_id = caller.user_id, employee_id = id, "Deleted submission");
                Ok(())
            }
            Err(DatabaseError::NotFound(_)) => Err(SubmissionError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_must_be_an_object() {
        for bad in [json!([1, 2]), json!("text"), json!(null), json!(3)] {
            let mut errors = FieldErrors::new();
            check_data(&bad, &mut errors);
            assert_eq!(errors["data"], "Expected a JSON object.");
        }

        let mut errors = FieldErrors::new();
        check_data(&json!({ "name": "Ada" }), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn null_characters_are_rejected_at_any_depth() {
        for bad in [
            json!({ "k": "v\u{0000}" }),
            json!({ "k\u{0000}": 1 }),
            json!({ "outer": [{ "inner": "\u{0000}" }] }),
        ] {
            let mut errors = FieldErrors::new();
            check_data(&bad, &mut errors);
            assert_eq!(errors["data"], NUL_MESSAGE);
        }
    }

    #[test]
    fn missing_form_message_names_the_id() {
        match form_error(42) {
            SubmissionError::Validation(errors) => {
                assert_eq!(errors["form"], "Invalid pk \"42\" - object does not exist.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
