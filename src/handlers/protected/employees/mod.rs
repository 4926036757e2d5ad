pub mod collection;
pub mod record;

// Re-export handler functions for use in routing
pub use collection::get as employees_get;
pub use collection::post as employees_post;

pub use record::delete as employee_delete;
pub use record::get as employee_get;
pub use record::patch as employee_patch;
pub use record::put as employee_put;

use serde::Deserialize;
use serde_json::Value;

/// Body of submission create and update requests
#[derive(Debug, Default, Deserialize)]
pub struct EmployeeRequest {
    pub form: Option<i64>,
    pub data: Option<Value>,
}
