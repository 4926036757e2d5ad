pub mod account_service;
pub mod employee_service;
pub mod form_service;

pub use account_service::{AccountError, AccountService, RegisterInput};
pub use employee_service::{SubmissionError, SubmissionService};
pub use form_service::{FieldInput, FormError, FormService};
