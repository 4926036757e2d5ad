use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::database::models::{DynamicForm, FieldType, FormField, FormRow};
use crate::database::{DatabaseError, Repository};
use crate::error::FieldErrors;
use crate::filter::{Filter, SortDirection};
use crate::middleware::AuthUser;

pub const DEFAULT_FIELD_ORDER: i32 = 10;
pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_LABEL_LENGTH: usize = 200;

/// Postgres text columns cannot store U+0000
pub(crate) const NUL_MESSAGE: &str = "Null characters are not allowed.";

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Invalid form schema: {0:?}")]
    Validation(FieldErrors),

    #[error("Form {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for FormError {
    fn from(err: sqlx::Error) -> Self {
        FormError::Database(err.into())
    }
}

/// One field as submitted by a client. Every attribute is optional here so
/// that a missing label reports as a field error instead of a JSON rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldInput {
    pub label: Option<String>,
    pub field_type: Option<String>,
    pub order: Option<i32>,
}

impl FieldInput {
    pub fn new(label: &str, field_type: &str, order: Option<i32>) -> Self {
        Self {
            label: Some(label.to_string()),
            field_type: Some(field_type.to_string()),
            order,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct NewField {
    label: String,
    field_type: FieldType,
    order: i32,
}

fn check_name(name: &str, errors: &mut FieldErrors) -> String {
    let name = name.trim();
    if name.is_empty() {
        errors.insert("name".to_string(), "This field may not be blank.".to_string());
    } else if name.contains('\0') {
        errors.insert("name".to_string(), NUL_MESSAGE.to_string());
    } else if name.chars().count() > MAX_NAME_LENGTH {
        errors.insert(
            "name".to_string(),
            format!("Ensure this field has no more than {} characters.", MAX_NAME_LENGTH),
        );
    }
    name.to_string()
}

fn check_fields(fields: &[FieldInput], errors: &mut FieldErrors) -> Vec<NewField> {
    let mut checked = Vec::with_capacity(fields.len());

    for (index, input) in fields.iter().enumerate() {
        let label = input.label.as_deref().map(str::trim).unwrap_or_default();
        if input.label.is_none() {
            errors.insert(format!("fields[{}].label", index), "This field is required.".to_string());
        } else if label.is_empty() {
            errors.insert(format!("fields[{}].label", index), "This field may not be blank.".to_string());
        } else if label.contains('\0') {
            errors.insert(format!("fields[{}].label", index), NUL_MESSAGE.to_string());
        } else if label.chars().count() > MAX_LABEL_LENGTH {
            errors.insert(
                format!("fields[{}].label", index),
                format!("Ensure this field has no more than {} characters.", MAX_LABEL_LENGTH),
            );
        }

        let field_type = match input.field_type.as_deref() {
            None => {
                errors.insert(format!("fields[{}].field_type", index), "This field is required.".to_string());
                None
            }
            Some(raw) => match raw.parse::<FieldType>() {
                Ok(field_type) => Some(field_type),
                Err(e) => {
                    errors.insert(format!("fields[{}].field_type", index), e.to_string());
                    None
                }
            },
        };

        if let Some(field_type) = field_type {
            checked.push(NewField {
                label: label.to_string(),
                field_type,
                order: input.order.unwrap_or(DEFAULT_FIELD_ORDER),
            });
        }
    }

    checked
}

/// Display order: `order`, then insertion
fn sort_fields(fields: &mut [FormField]) {
    fields.sort_by_key(|f| (f.order, f.id));
}

/// Form schemas with their ordered fields. Multi-row writes run in one
/// transaction that rolls back when dropped uncommitted.
pub struct FormService {
    pool: PgPool,
}

impl FormService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn forms(&self) -> Repository<FormRow> {
        Repository::new("dynamic_forms", self.pool.clone())
    }

    pub async fn create_form(
        &self,
        caller: &AuthUser,
        name: &str,
        fields: &[FieldInput],
    ) -> Result<DynamicForm, FormError> {
        let mut errors = FieldErrors::new();
        let name = check_name(name, &mut errors);
        let fields = check_fields(fields, &mut errors);
        if !errors.is_empty() {
            debug!("Rejected form schema: {:?}", errors);
            return Err(FormError::Validation(errors));
        }

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, FormRow>(
            "INSERT INTO dynamic_forms (name, created_by) VALUES ($1, $2) RETURNING *",
        )
        .bind(&name)
        .bind(caller.user_id)
        .fetch_one(&mut *tx)
        .await?;

        let fields = insert_fields(&mut *tx, row.id, &fields).await?;
        tx.commit().await?;

        info!(
            user_id = caller.user_id,
            form_id = row.id,
            "Created form \"{}\" with {} fields",
            row.name,
            fields.len()
        );
        Ok(DynamicForm::from_row(row, fields))
    }

    /// `name` is replaced when given. `fields`, when given, replaces the whole
    /// field list; new field ids are assigned.
    pub async fn update_form(
        &self,
        caller: &AuthUser,
        form_id: i64,
        name: Option<&str>,
        fields: Option<&[FieldInput]>,
    ) -> Result<DynamicForm, FormError> {
        let mut tx = self.pool.begin().await?;

        let mut row = sqlx::query_as::<_, FormRow>("SELECT * FROM dynamic_forms WHERE id = $1 FOR UPDATE")
            .bind(form_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(FormError::NotFound(form_id))?;

        let mut errors = FieldErrors::new();
        let name = name.map(|n| check_name(n, &mut errors));
        let fields = fields.map(|f| check_fields(f, &mut errors));
        if !errors.is_empty() {
            debug!(form_id, "Rejected form update: {:?}", errors);
            return Err(FormError::Validation(errors));
        }

        if let Some(name) = name {
            row = sqlx::query_as::<_, FormRow>("UPDATE dynamic_forms SET name = $1 WHERE id = $2 RETURNING *")
                .bind(&name)
                .bind(form_id)
                .fetch_one(&mut *tx)
                .await?;
        }

        let stored = match fields {
            Some(fields) => {
                let removed = sqlx::query("DELETE FROM form_fields WHERE form_id = $1")
                    .bind(form_id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                debug!(form_id, "Replacing {} fields with {}", removed, fields.len());
                insert_fields(&mut *tx, form_id, &fields).await?
            }
            None => select_fields(&mut *tx, &[form_id]).await?,
        };

        tx.commit().await?;

        info!(user_id = caller.user_id, form_id, "Updated form \"{}\"", row.name);
        Ok(DynamicForm::from_row(row, stored))
    }

    pub async fn get_form(&self, form_id: i64) -> Result<DynamicForm, FormError> {
        let row = self
            .forms()
            .select_one(form_id)
            .await?
            .ok_or(FormError::NotFound(form_id))?;

        let mut conn = self.pool.acquire().await?;
        let fields = select_fields(&mut *conn, &[form_id]).await?;
        Ok(DynamicForm::from_row(row, fields))
    }

    /// All forms by id, each with its fields in display order
    pub async fn list_forms(&self) -> Result<Vec<DynamicForm>, FormError> {
        let mut filter = Filter::new("dynamic_forms").map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        filter
            .order("id", SortDirection::Asc)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        let rows = self.forms().select_any(&filter).await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut conn = self.pool.acquire().await?;
        let mut by_form: HashMap<i64, Vec<FormField>> = HashMap::new();
        for field in select_fields(&mut *conn, &ids).await? {
            by_form.entry(field.form_id).or_default().push(field);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let fields = by_form.remove(&row.id).unwrap_or_default();
                DynamicForm::from_row(row, fields)
            })
            .collect())
    }

    /// Fields and submissions go with the form
    pub async fn delete_form(&self, caller: &AuthUser, form_id: i64) -> Result<(), FormError> {
        match self.forms().delete_404(form_id).await {
            Ok(()) => {
                info!(user_id = caller.user_id, form_id, "Deleted form");
                Ok(())
            }
            Err(DatabaseError::NotFound(_)) => Err(FormError::NotFound(form_id)),
            Err(e) => Err(e.into()),
        }
    }
}

async fn insert_fields(
    conn: &mut PgConnection,
    form_id: i64,
    fields: &[NewField],
) -> Result<Vec<FormField>, sqlx::Error> {
    let mut stored = Vec::with_capacity(fields.len());
    for field in fields {
        let row = sqlx::query_as::<_, FormField>(
            "INSERT INTO form_fields (form_id, label, field_type, \"order\") VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(form_id)
        .bind(&field.label)
        .bind(field.field_type.as_str())
        .bind(field.order)
        .fetch_one(&mut *conn)
        .await?;
        stored.push(row);
    }
    sort_fields(&mut stored);
    Ok(stored)
}

async fn select_fields(conn: &mut PgConnection, form_ids: &[i64]) -> Result<Vec<FormField>, sqlx::Error> {
    sqlx::query_as::<_, FormField>(
        "SELECT * FROM form_fields WHERE form_id = ANY($1) ORDER BY form_id, \"order\", id",
    )
    .bind(form_ids)
    .fetch_all(conn)
    .await
}
