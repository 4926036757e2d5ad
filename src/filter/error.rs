use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidParameter { field: String, message: String },

    #[error("{0}")]
    InvalidPage(String),
}

impl FilterError {
    pub fn parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        FilterError::InvalidParameter {
            field: field.into(),
            message: message.into(),
        }
    }
}
