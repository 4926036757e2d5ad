pub mod employee;
pub mod form;
pub mod user;

pub use employee::Employee;
pub use form::{DynamicForm, FieldType, FormField, FormRow};
pub use user::User;
