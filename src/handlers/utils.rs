use crate::error::{ApiError, FieldErrors};

pub const REQUIRED: &str = "This field is required.";

/// Records a "required" error for `field` when the value is absent
pub fn required<T: Default>(value: Option<T>, field: &str, errors: &mut FieldErrors) -> T {
    match value {
        Some(value) => value,
        None => {
            errors.insert(field.to_string(), REQUIRED.to_string());
            T::default()
        }
    }
}

pub fn reject_missing(errors: FieldErrors) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("Invalid input", Some(errors)))
    }
}

/// Path ids that are not integers cannot name a row
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::not_found("Not found."))
}
