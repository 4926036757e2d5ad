use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

/// A submission: one JSON payload filled in against a form
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Employee {
    pub id: i64,
    #[serde(rename = "form")]
    pub form_id: i64,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}
