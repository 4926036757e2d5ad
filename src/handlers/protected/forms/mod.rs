pub mod collection;
pub mod record;

// Re-export handler functions for use in routing
pub use collection::get as forms_get;
pub use collection::post as forms_post;

pub use record::delete as form_delete;
pub use record::get as form_get;
pub use record::patch as form_patch;
pub use record::put as form_put;

use serde::Deserialize;

use crate::services::FieldInput;

/// Body of form create and update requests
#[derive(Debug, Default, Deserialize)]
pub struct FormRequest {
    pub name: Option<String>,
    pub fields: Option<Vec<FieldInput>>,
}
