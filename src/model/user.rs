use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub employee_number: String,
    pub email: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub department_id: Option<u64>,
    pub is_active: bool,
    pub failed_login_attempts: u32,
    pub is_locked: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Public directory view, safe to return to any authenticated user.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 7,
    "employee_number": "4821",
    "first_name": "Jane",
    "last_name": "Wanjiku",
    "email": "jane.wanjiku@ministry.go.ke",
    "role": "staff",
    "department_id": 2
}))]
pub struct UserSummary {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "4821")]
    pub employee_number: String,
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Wanjiku")]
    pub last_name: String,
    #[schema(example = "jane.wanjiku@ministry.go.ke", format = "email")]
    pub email: String,
    pub role: Role,
    #[schema(example = 2, nullable = true)]
    pub department_id: Option<u64>,
}
